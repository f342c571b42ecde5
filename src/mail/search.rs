use chrono::{Days, Local, NaiveDate};

/// Server-side filters applied to the unread search. Every set term narrows
/// the result; unset terms are left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub sender: Option<String>,
    pub subject: Option<String>,
    /// Only messages received within this many days; 0 disables the term.
    pub since_days: u32,
}

impl SearchFilter {
    /// Query for today's local date.
    pub fn query(&self) -> String {
        self.to_query(Local::now().date_naive())
    }

    /// IMAP SEARCH criteria. Terms inside a parenthesized list are ANDed.
    /// Non-ASCII filter text needs an explicit CHARSET.
    pub fn to_query(&self, today: NaiveDate) -> String {
        let mut criteria = vec!["UNSEEN".to_string()];

        if let Some(sender) = self.sender.as_deref().filter(|s| !s.is_empty()) {
            criteria.push(format!("FROM {}", quote(sender)));
        }
        if let Some(subject) = self.subject.as_deref().filter(|s| !s.is_empty()) {
            criteria.push(format!("SUBJECT {}", quote(subject)));
        }
        if self.since_days > 0 {
            let since = today
                .checked_sub_days(Days::new(u64::from(self.since_days)))
                .unwrap_or(NaiveDate::MIN);
            criteria.push(format!("SINCE {}", since.format("%d-%b-%Y")));
        }

        let list = format!("({})", criteria.join(" "));
        if list.is_ascii() {
            list
        } else {
            format!("CHARSET UTF-8 {list}")
        }
    }
}

/// IMAP quoted string. CR and LF cannot appear in one and would end the
/// command line, so they are dropped.
fn quote(value: &str) -> String {
    let escaped = value
        .replace(['\r', '\n'], "")
        .replace('\\', "\\\\")
        .replace('"', "\\\"");
    format!("\"{escaped}\"")
}
