//! State store error types.

use std::path::PathBuf;

/// Errors produced by [`StateStore`](crate::StateStore) operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// File-system I/O failure.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The state document is not a JSON object of bookmarks.
    #[error("invalid state document {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The state document could not be serialized.
    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),

    /// Internal mutex was poisoned by a panicked thread.
    #[error("state store lock poisoned")]
    LockPoisoned,
}

impl StateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, StateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_poisoned_displays() {
        let err = StateError::LockPoisoned;
        assert_eq!(err.to_string(), "state store lock poisoned");
    }

    #[test]
    fn io_error_names_path() {
        let inner = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StateError::io("/tmp/state.json", inner);
        let msg = err.to_string();
        assert!(msg.contains("i/o"), "got: {msg}");
        assert!(msg.contains("/tmp/state.json"), "got: {msg}");
    }
}
