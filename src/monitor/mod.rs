use log::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::domain::email::MessageSummary;
use crate::error::MonitorResult;
use crate::mail::decoders::summarize_headers;
use crate::mail::imap_client;
use crate::mail::session::MailSession;
use crate::store::repo::StateStore;

/// Most recent matches fetched per run.
pub const FETCH_CAP: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub total_unread: usize,
    pub new_emails: Vec<MessageSummary>,
}

/// One full monitor run against the configured server.
pub fn run(cfg: &MonitorConfig, store: &dyn StateStore, dry_run: bool) -> MonitorResult<RunOutcome> {
    let mut session = imap_client::connect(cfg)?;
    run_with_session(session.as_mut(), cfg, store, dry_run)
}

/// Everything after the connect: search, fetch, log out, diff, persist.
pub fn run_with_session(
    session: &mut dyn MailSession,
    cfg: &MonitorConfig,
    store: &dyn StateStore,
    dry_run: bool,
) -> MonitorResult<RunOutcome> {
    let fetched = collect_unread(session, cfg);
    if let Err(e) = session.close() {
        warn!("{e}");
    }
    let fetched = fetched?;

    let new_emails = diff_and_update(&fetched, store, dry_run);
    info!("Found {} unread, {} new", fetched.len(), new_emails.len());

    Ok(RunOutcome {
        total_unread: fetched.len(),
        new_emails,
    })
}

/// Search the folder and decode the headers of the newest matches, in
/// ascending UID order. Only a failure to open the folder is an error.
pub fn collect_unread(
    session: &mut dyn MailSession,
    cfg: &MonitorConfig,
) -> MonitorResult<Vec<MessageSummary>> {
    session.open_read_only(&cfg.folder)?;

    let query = cfg.filter.query();
    debug!("Searching {} with {query}", cfg.folder);
    let mut uids = match session.search_uids(&query) {
        Ok(uids) => uids,
        Err(e) => {
            error!("{e}");
            return Ok(Vec::new());
        }
    };
    uids.sort_unstable();
    uids.dedup();

    let newest = &uids[uids.len().saturating_sub(FETCH_CAP)..];
    if newest.len() < uids.len() {
        debug!("{} matches, fetching newest {}", uids.len(), newest.len());
    }

    let mut out = Vec::with_capacity(newest.len());
    for &uid in newest {
        match session
            .fetch_header(uid)
            .and_then(|raw| summarize_headers(uid, &raw))
        {
            Ok(summary) => out.push(summary),
            Err(e) => warn!("Skipping message: {e}"),
        }
    }
    Ok(out)
}

/// Messages in `fetched` not reported before. Unless `dry_run`, every fetched
/// UID is then remembered in `store`; a failed save is logged, not returned.
pub fn diff_and_update(
    fetched: &[MessageSummary],
    store: &dyn StateStore,
    dry_run: bool,
) -> Vec<MessageSummary> {
    let mut seen = store.load();
    let new_emails: Vec<MessageSummary> = fetched
        .iter()
        .filter(|m| !seen.contains(&m.id))
        .cloned()
        .collect();

    if dry_run {
        debug!("Dry run; seen-state left untouched");
        return new_emails;
    }

    seen.record(fetched.iter().map(|m| &m.id));
    if let Err(e) = store.save(&seen) {
        error!("{e}; new messages will be reported again next run");
    }
    new_emails
}
