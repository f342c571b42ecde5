use crate::domain::seen::SeenState;
use crate::error::MonitorResult;

/// Durable home of the seen-state between runs.
pub trait StateStore {
    /// Never fails: a missing or unreadable store reads as a first run.
    fn load(&self) -> SeenState;
    fn save(&self, state: &SeenState) -> MonitorResult<()>;
}
