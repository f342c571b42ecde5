use crate::error::MonitorResult;

/// The mailbox operations a monitor run needs from an authenticated session.
pub trait MailSession {
    /// Open `folder` without changing any flags; returns its message count.
    fn open_read_only(&mut self, folder: &str) -> MonitorResult<u32>;

    /// UIDs matching an IMAP SEARCH query.
    fn search_uids(&mut self, query: &str) -> MonitorResult<Vec<u32>>;

    /// The raw header block of one message.
    fn fetch_header(&mut self, uid: u32) -> MonitorResult<Vec<u8>>;

    fn close(&mut self) -> MonitorResult<()>;
}
