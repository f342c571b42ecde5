use serde::{Deserialize, Serialize};

/// IMAP UID rendered as text; opaque to everything but the mail layer.
pub type EmailId = String;

/// Decoded headers of one unread message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    #[serde(rename = "uid")]
    pub id: EmailId,
    #[serde(rename = "from")]
    pub sender: String,
    pub subject: String,
    pub date: String,
}
