use thiserror::Error;

/// Everything that can go wrong during a monitor run.
///
/// Only `Config` and `Connection` abort a run; the others are logged and
/// degraded by the stage that hits them.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("{0}")]
    Config(String),

    #[error("IMAP connection failed: {0}")]
    Connection(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Fetch failed for UID {uid}: {reason}")]
    Fetch { uid: String, reason: String },

    #[error("State store error: {0}")]
    StateStore(String),
}

impl MonitorError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, MonitorError::Config(_) | MonitorError::Connection(_))
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
