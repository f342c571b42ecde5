use log::{debug, info};
use native_tls::TlsConnector;
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::{MonitorConfig, TlsMode};
use crate::error::{MonitorError, MonitorResult};
use crate::mail::session::MailSession;

/// Open an authenticated session as described by `cfg`.
pub fn connect(cfg: &MonitorConfig) -> MonitorResult<Box<dyn MailSession>> {
    info!(
        "Connecting to {}:{} ({:?}, timeout {}s)",
        cfg.host,
        cfg.port,
        cfg.tls,
        cfg.timeout.as_secs()
    );
    let tcp = open_tcp(&cfg.host, cfg.port, cfg.timeout)?;

    let session: Box<dyn MailSession> = match cfg.tls {
        TlsMode::Implicit => {
            let stream = tls_connector()?
                .connect(cfg.host.as_str(), tcp)
                .map_err(|e| MonitorError::Connection(format!("TLS handshake failed: {e}")))?;
            let mut client = imap::Client::new(stream);
            read_greeting(&mut client, cfg.timeout)?;
            Box::new(login(client, cfg)?)
        }
        TlsMode::StartTls => {
            let mut client = imap::Client::new(tcp);
            read_greeting(&mut client, cfg.timeout)?;
            let client = client
                .secure(cfg.host.as_str(), &tls_connector()?)
                .map_err(|e| MonitorError::Connection(format!("STARTTLS failed: {e}")))?;
            Box::new(login(client, cfg)?)
        }
        TlsMode::Plain => {
            let mut client = imap::Client::new(tcp);
            read_greeting(&mut client, cfg.timeout)?;
            Box::new(login(client, cfg)?)
        }
    };

    info!("Logged in as {}", cfg.username);
    Ok(session)
}

fn tls_connector() -> MonitorResult<TlsConnector> {
    TlsConnector::builder()
        .build()
        .map_err(|e| MonitorError::Connection(format!("TLS setup failed: {e}")))
}

/// TCP connect bounded by `timeout`, which then also bounds every read and
/// write on the socket. A zero timeout means no bound.
fn open_tcp(host: &str, port: u16, timeout: Duration) -> MonitorResult<TcpStream> {
    let timeout = (!timeout.is_zero()).then_some(timeout);
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| MonitorError::Connection(format!("cannot resolve {host}: {e}")))?;

    let mut last_err = None;
    for addr in addrs {
        debug!("Trying {addr}");
        let attempt = match timeout {
            Some(t) => TcpStream::connect_timeout(&addr, t),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => {
                stream
                    .set_read_timeout(timeout)
                    .and_then(|_| stream.set_write_timeout(timeout))
                    .map_err(|e| MonitorError::Connection(e.to_string()))?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(MonitorError::Connection(match (last_err, timeout) {
        (Some(e), Some(t)) if is_timeout(&e) => format!("{host}:{port}: {}", timed_out(t)),
        (Some(e), _) => format!("{host}:{port}: {e}"),
        (None, _) => format!("no addresses found for {host}"),
    }))
}

fn is_timeout(e: &io::Error) -> bool {
    // an expired socket read timeout surfaces as WouldBlock on Unix
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn timed_out(timeout: Duration) -> String {
    format!("timed out after {}s", timeout.as_secs())
}

/// The timeout wording for socket timeouts, the IMAP error text otherwise.
fn describe(e: &imap::error::Error, timeout: Duration) -> String {
    match e {
        imap::error::Error::Io(io) if is_timeout(io) => timed_out(timeout),
        other => other.to_string(),
    }
}

fn read_greeting<T: Read + Write>(
    client: &mut imap::Client<T>,
    timeout: Duration,
) -> MonitorResult<()> {
    client.read_greeting().map(|_| ()).map_err(|e| {
        MonitorError::Connection(format!("no server greeting: {}", describe(&e, timeout)))
    })
}

fn login<T: Read + Write>(
    client: imap::Client<T>,
    cfg: &MonitorConfig,
) -> MonitorResult<imap::Session<T>> {
    client
        .login(&cfg.username, &cfg.password)
        .map_err(|(e, _client)| match e {
            imap::error::Error::Io(ref io) if is_timeout(io) => {
                MonitorError::Connection(format!("login: {}", timed_out(cfg.timeout)))
            }
            e => MonitorError::Connection(format!("login rejected: {e}")),
        })
}

impl<T: Read + Write> MailSession for imap::Session<T> {
    fn open_read_only(&mut self, folder: &str) -> MonitorResult<u32> {
        let mailbox = self.examine(folder).map_err(|e| {
            MonitorError::Connection(format!("cannot open folder {folder}: {e}"))
        })?;
        debug!("{folder} has {} messages", mailbox.exists);
        Ok(mailbox.exists)
    }

    fn search_uids(&mut self, query: &str) -> MonitorResult<Vec<u32>> {
        let uids = self
            .uid_search(query)
            .map_err(|e| MonitorError::Search(e.to_string()))?;
        Ok(uids.into_iter().collect())
    }

    fn fetch_header(&mut self, uid: u32) -> MonitorResult<Vec<u8>> {
        let fetch_err = |reason: String| MonitorError::Fetch {
            uid: uid.to_string(),
            reason,
        };

        // RFC822.HEADER never sets \Seen
        let fetches = self
            .uid_fetch(uid.to_string(), "RFC822.HEADER")
            .map_err(|e| fetch_err(e.to_string()))?;

        fetches
            .iter()
            .find_map(|f| f.header().map(<[u8]>::to_vec))
            .ok_or_else(|| fetch_err("server returned no header".to_string()))
    }

    fn close(&mut self) -> MonitorResult<()> {
        self.logout()
            .map_err(|e| MonitorError::Connection(format!("logout failed: {e}")))
    }
}
