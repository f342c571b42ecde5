use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::seen::SeenState;
use crate::error::{MonitorError, MonitorResult};
use crate::store::repo::StateStore;

/// Seen-state kept as a small JSON document: `{"seen_uids": [...]}`.
pub struct JsonStateFile {
    path: PathBuf,
}

impl JsonStateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> MonitorResult<SeenState> {
        let s = fs::read_to_string(&self.path).map_err(|e| self.error("read", e))?;
        serde_json::from_str(&s).map_err(|e| self.error("parse", e))
    }

    fn error(&self, action: &str, e: impl std::fmt::Display) -> MonitorError {
        MonitorError::StateStore(format!(
            "cannot {action} {}: {e}",
            self.path.display()
        ))
    }
}

impl StateStore for JsonStateFile {
    fn load(&self) -> SeenState {
        if !self.path.exists() {
            debug!("No state at {}; first run", self.path.display());
            return SeenState::default();
        }
        match self.read() {
            Ok(state) => state,
            Err(e) => {
                warn!("{e}; starting with empty state");
                SeenState::default()
            }
        }
    }

    fn save(&self, state: &SeenState) -> MonitorResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.error("create directory for", e))?;
        }
        let s = serde_json::to_string(state).map_err(|e| self.error("serialize", e))?;

        // write-then-rename so an interrupted run leaves the old state intact
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, s).map_err(|e| self.error("write", e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.error("replace", e))?;
        debug!("Saved {} seen UIDs to {}", state.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_first_run() {
        let dir = tempdir().unwrap();
        let store = JsonStateFile::new(dir.path().join("state.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn garbage_file_is_first_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();
        assert!(JsonStateFile::new(&path).load().is_empty());
    }

    #[test]
    fn save_creates_directories_and_load_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/state.json");
        let store = JsonStateFile::new(&path);

        store.save(&SeenState::from_ids(["3", "1", "2"])).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"{"seen_uids":["3","1","2"]}"#
        );
        assert_eq!(store.load().ids(), ["3", "1", "2"]);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn save_into_unwritable_location_is_an_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = JsonStateFile::new(blocker.join("state.json"));

        let err = store.save(&SeenState::default()).unwrap_err();
        assert!(matches!(err, MonitorError::StateStore(_)));
    }
}
