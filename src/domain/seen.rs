use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::email::EmailId;

/// Upper bound on remembered identifiers.
pub const SEEN_CAP: usize = 500;

/// Identifiers already reported, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenState {
    #[serde(default)]
    seen_uids: Vec<EmailId>,
}

impl SeenState {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<EmailId>,
    {
        Self {
            seen_uids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ids(&self) -> &[EmailId] {
        &self.seen_uids
    }

    pub fn len(&self) -> usize {
        self.seen_uids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen_uids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen_uids.iter().any(|s| s == id)
    }

    /// Append identifiers not yet present, keeping their order, then evict
    /// from the front until at most `SEEN_CAP` remain.
    pub fn record<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a EmailId>,
    {
        let mut known: HashSet<EmailId> = self.seen_uids.iter().cloned().collect();
        for id in ids {
            if known.insert(id.clone()) {
                self.seen_uids.push(id.clone());
            }
        }
        self.truncate_to(SEEN_CAP);
    }

    fn truncate_to(&mut self, cap: usize) {
        if self.seen_uids.len() > cap {
            let excess = self.seen_uids.len() - cap;
            self.seen_uids.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_appends_unknown_ids_in_order() {
        let mut seen = SeenState::from_ids(["101"]);
        let fetched: Vec<EmailId> = vec!["101".into(), "102".into(), "103".into()];
        seen.record(&fetched);
        assert_eq!(seen.ids(), ["101", "102", "103"]);
    }

    #[test]
    fn record_evicts_oldest_past_cap() {
        let mut seen = SeenState::from_ids((0..SEEN_CAP).map(|i| i.to_string()));
        let fetched: Vec<EmailId> = (1000..1005).map(|i| i.to_string()).collect();
        seen.record(&fetched);

        assert_eq!(seen.len(), SEEN_CAP);
        assert_eq!(seen.ids()[0], "5");
        assert!(!seen.contains("4"));
        assert!(fetched.iter().all(|id| seen.contains(id)));
        assert_eq!(seen.ids()[SEEN_CAP - 1], "1004");
    }

    #[test]
    fn oversized_loaded_state_is_capped_on_record() {
        let mut seen = SeenState::from_ids((0..SEEN_CAP + 20).map(|i| i.to_string()));
        seen.record(std::iter::empty());
        assert_eq!(seen.len(), SEEN_CAP);
        assert_eq!(seen.ids()[0], "20");
    }

    #[test]
    fn serializes_as_seen_uids_record() {
        let seen = SeenState::from_ids(["1", "2"]);
        let json = serde_json::to_string(&seen).unwrap();
        assert_eq!(json, r#"{"seen_uids":["1","2"]}"#);
        let back: SeenState = serde_json::from_str("{}").unwrap();
        assert!(back.is_empty());
    }
}
