//! JSON-file implementation of [`StateStore`].
//!
//! The document is written to a sibling temporary file and renamed over the
//! target, so a crash mid-write never leaves a truncated state file behind.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use exacttap_types::state::State;

use crate::backend::StateStore;
use crate::error::{self, StateError};

/// State document stored as a JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(".");
        name.push(self.path.file_name().unwrap_or_else(|| "state.json".as_ref()));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStateStore {
    fn load(&self) -> error::Result<State> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No state file, starting empty");
                return Ok(State::new());
            }
            Err(e) => return Err(StateError::io(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(State::new());
        }

        let state: State = serde_json::from_str(&content).map_err(|source| StateError::Decode {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(
            path = %self.path.display(),
            streams = state.len(),
            "Loaded state"
        );
        Ok(state)
    }

    fn save(&self, state: &State) -> error::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StateError::io(parent, e))?;
        }

        let body = serde_json::to_vec_pretty(state).map_err(StateError::Encode)?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, body).map_err(|e| StateError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StateError::io(&self.path, e))?;

        tracing::info!(
            path = %self.path.display(),
            streams = state.len(),
            "Persisted state"
        );
        Ok(())
    }
}
