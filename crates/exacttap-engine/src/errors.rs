//! Run-level error model.
//!
//! [`TapError`] covers every failure that ends a run with a non-zero exit.
//! Per-stream failures are [`AccessorError`]s and never reach this level:
//! the orchestrator logs them and moves on.

use std::path::PathBuf;

use exacttap_state::StateError;
use exacttap_types::error::AccessorError;

use crate::client::ApiError;

/// Config, catalog or environment problem detected before any network access.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {what} file {path}: {source}")]
    Read {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {what} file {path}; is it valid JSON? ({source})")]
    Decode {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing environment variable(s): {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("config validation failed:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),
}

/// The catalog selects streams in a combination that cannot be replicated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error(
        "cannot replicate `{stream}` without `{carrier}`; select `{carrier}` and try again"
    )]
    MissingCarrier {
        stream: String,
        carrier: &'static str,
    },

    #[error("stream `{0}` is selected more than once")]
    DuplicateStream(String),
}

/// Fatal run error.
#[derive(Debug, thiserror::Error)]
pub enum TapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("failed to establish API session: {0}")]
    Auth(#[source] ApiError),

    #[error("discovery of `{stream}` failed: {source}")]
    Discovery {
        stream: &'static str,
        #[source]
        source: AccessorError,
    },

    #[error(transparent)]
    State(#[from] StateError),

    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),
}
