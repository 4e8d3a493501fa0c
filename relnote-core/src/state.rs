//! Persisted run state
//!
//! A single JSON record holding the end timestamp of the last committed run.
//! The store is read once at run start and written at most once at run end;
//! a run that fails mid-pipeline never writes, so the next run re-covers the
//! same window instead of silently dropping tickets.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Timestamp of the last committed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// End of the latest window whose output was delivered or intentionally
    /// discarded
    pub last_run: Option<DateTime<Utc>>,
}

/// File-backed store for [`RunState`]
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Create a store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the default location
    ///
    /// Uses `~/.local/share/relnote/state.json` on Unix.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))?;
        Ok(Self::new(dir.join("relnote").join("state.json")))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted state
    ///
    /// A missing file is a first run and yields the default (empty) state.
    pub fn load(&self) -> Result<RunState> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No run state found, first run");
            return Ok(RunState::default());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(Error::Io)?;
        let state: RunState = serde_json::from_str(&contents)?;
        debug!(last_run = ?state.last_run, "Loaded run state");
        Ok(state)
    }

    /// Persist a new state, superseding the previous record
    pub fn save(&self, state: &RunState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        let contents = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, contents).map_err(Error::Io)?;
        debug!(path = %self.path.display(), last_run = ?state.last_run, "Saved run state");
        Ok(())
    }

    /// Remove the persisted state, if any
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(Error::Io)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ts(s: &str) -> DateTime<Utc> {
        format!("{}T00:00:00Z", s).parse().unwrap()
    }

    #[test]
    fn test_missing_file_is_first_run() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let state = store.load().unwrap();
        assert!(state.last_run.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("state.json"));

        let state = RunState {
            last_run: Some(ts("2025-01-15")),
        };
        store.save(&state).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, state);
    }

    #[test]
    fn test_save_supersedes_previous() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        store
            .save(&RunState {
                last_run: Some(ts("2025-01-01")),
            })
            .unwrap();
        store
            .save(&RunState {
                last_run: Some(ts("2025-02-01")),
            })
            .unwrap();

        assert_eq!(store.load().unwrap().last_run, Some(ts("2025-02-01")));
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        store
            .save(&RunState {
                last_run: Some(ts("2025-01-01")),
            })
            .unwrap();

        store.clear().unwrap();
        assert!(store.load().unwrap().last_run.is_none());

        // Clearing an absent file is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let store = StateStore::new(path);
        assert!(store.load().is_err());
    }
}
