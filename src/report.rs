use serde::Serialize;

use crate::domain::email::MessageSummary;
use crate::error::MonitorError;
use crate::monitor::RunOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Human,
}

/// What a run prints: a summary of new mail or the error that stopped it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Report {
    Ok {
        total_unread: usize,
        new_count: usize,
        new_emails: Vec<MessageSummary>,
    },
    Error {
        error: String,
    },
}

impl Report {
    pub fn from_outcome(outcome: RunOutcome) -> Self {
        Report::Ok {
            total_unread: outcome.total_unread,
            new_count: outcome.new_emails.len(),
            new_emails: outcome.new_emails,
        }
    }

    pub fn from_error(err: &MonitorError) -> Self {
        Report::Error {
            error: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Report::Ok { .. })
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => self.to_json(),
            OutputFormat::Human => self.to_human(),
        }
    }

    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "status": "error", "error": e.to_string() }).to_string()
        })
    }

    fn to_human(&self) -> String {
        match self {
            Report::Error { error } => format!("ERROR: {error}"),
            Report::Ok {
                total_unread,
                new_emails,
                ..
            } if new_emails.is_empty() => {
                format!("\u{2705} IMAP Monitor: No new emails ({total_unread} unread total)")
            }
            Report::Ok { new_emails, .. } => {
                let mut lines = vec![format!(
                    "\u{1f4e7} IMAP Monitor: {} new email(s)",
                    new_emails.len()
                )];
                for m in new_emails {
                    lines.push(format!("  \u{2022} From: {}", m.sender));
                    lines.push(format!("    Subject: {}", m.subject));
                    lines.push(format!("    Date: {}", m.date));
                    lines.push(String::new());
                }
                lines.join("\n")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome() -> RunOutcome {
        RunOutcome {
            total_unread: 3,
            new_emails: vec![MessageSummary {
                id: "102".into(),
                sender: "Zo\u{eb} <zoe@example.com>".into(),
                subject: "Invoice".into(),
                date: "Sat, 17 Oct 2026 09:12:00 +0200".into(),
            }],
        }
    }

    #[test]
    fn json_ok_shape() {
        let json = Report::from_outcome(outcome()).render(OutputFormat::Json);
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["status"], "ok");
        assert_eq!(v["total_unread"], 3);
        assert_eq!(v["new_count"], 1);
        assert_eq!(v["new_emails"][0]["uid"], "102");
        assert_eq!(v["new_emails"][0]["from"], "Zo\u{eb} <zoe@example.com>");
        assert_eq!(v["new_emails"][0]["subject"], "Invoice");
        assert!(json.contains("Zo\u{eb}"), "non-ASCII must not be escaped");
        assert!(!json.contains('\n'));
    }

    #[test]
    fn json_error_shape() {
        let err = MonitorError::Config("Missing required env vars: IMAP_HOST".into());
        let json = Report::from_error(&err).render(OutputFormat::Json);
        assert_eq!(
            json,
            r#"{"status":"error","error":"Missing required env vars: IMAP_HOST"}"#
        );
    }

    #[test]
    fn human_lists_new_messages() {
        let text = Report::from_outcome(outcome()).render(OutputFormat::Human);
        assert!(text.starts_with("\u{1f4e7} IMAP Monitor: 1 new email(s)\n"));
        assert!(text.contains("  \u{2022} From: Zo\u{eb} <zoe@example.com>\n"));
        assert!(text.contains("    Subject: Invoice\n"));
        assert!(text.contains("    Date: Sat, 17 Oct 2026 09:12:00 +0200\n"));
    }

    #[test]
    fn human_no_new_and_error_are_single_lines() {
        let none = Report::from_outcome(RunOutcome {
            total_unread: 4,
            new_emails: vec![],
        });
        assert_eq!(
            none.render(OutputFormat::Human),
            "\u{2705} IMAP Monitor: No new emails (4 unread total)"
        );

        let err = Report::from_error(&MonitorError::Connection("timed out".into()));
        assert!(!err.is_ok());
        assert_eq!(
            err.render(OutputFormat::Human),
            "ERROR: IMAP connection failed: timed out"
        );
    }
}
