use log::warn;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{MonitorError, MonitorResult};
use crate::mail::search::SearchFilter;

pub const DEFAULT_PORT: u16 = 993;
pub const DEFAULT_FOLDER: &str = "INBOX";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SINCE_DAYS: u32 = 1;

/// How the connection to the server is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS handshake right after the TCP connect (usually port 993).
    Implicit,
    /// Plaintext greeting, then upgrade with STARTTLS (usually port 143).
    StartTls,
    Plain,
}

impl TlsMode {
    fn from_flags(ssl: bool, starttls: bool) -> Self {
        match (ssl, starttls) {
            (true, true) => {
                warn!("Both IMAP_SSL and IMAP_STARTTLS are set; using TLS on connect");
                TlsMode::Implicit
            }
            (true, false) => TlsMode::Implicit,
            (false, true) => TlsMode::StartTls,
            (false, false) => TlsMode::Plain,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub tls: TlsMode,
    pub folder: String,
    pub timeout: Duration,
    pub filter: SearchFilter,
    pub log_file: PathBuf,
    pub state_file: PathBuf,
}

impl MonitorConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> MonitorResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    ///
    /// Required settings are checked before anything else so that a missing
    /// host or credential is reported without touching the network.
    pub fn from_lookup<F>(lookup: F) -> MonitorResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let missing: Vec<&str> = ["IMAP_HOST", "IMAP_USER", "IMAP_PASS"]
            .into_iter()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(MonitorError::Config(format!(
                "Missing required env vars: {}",
                missing.join(", ")
            )));
        }

        let ssl = get("IMAP_SSL").map(|v| parse_flag(&v)).unwrap_or(true);
        let starttls = get("IMAP_STARTTLS")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Self {
            host: get("IMAP_HOST").unwrap_or_default(),
            port: parse_or(&get, "IMAP_PORT", DEFAULT_PORT)?,
            username: get("IMAP_USER").unwrap_or_default(),
            password: get("IMAP_PASS").unwrap_or_default(),
            tls: TlsMode::from_flags(ssl, starttls),
            folder: get("IMAP_FOLDER").unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
            timeout: Duration::from_secs(parse_or(&get, "IMAP_TIMEOUT", DEFAULT_TIMEOUT_SECS)?),
            filter: SearchFilter {
                sender: get("FILTER_SENDER"),
                subject: get("FILTER_SUBJECT"),
                since_days: parse_or(&get, "FILTER_SINCE_DAYS", DEFAULT_SINCE_DAYS)?,
            },
            log_file: log_file_from(&lookup),
            state_file: get("IMAP_MONITOR_STATE")
                .map(PathBuf::from)
                .unwrap_or_else(|| home_path(".openclaw-imap-monitor-state.json")),
        })
    }
}

/// Log file location, resolvable before the rest of the configuration so the
/// logger is up when configuration errors are reported.
pub fn log_file_from<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("IMAP_MONITOR_LOG")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home_path("logs/imap-monitor.log"))
}

fn home_path(rel: &str) -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(rel)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> MonitorResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| MonitorError::Config(format!("Invalid {key}: {e}"))),
        None => Ok(default),
    }
}
