//! Stream orchestration and incremental-replication engine.
//!
//! Turns a catalog of selected streams into an ordered execution plan
//! ([`resolve`]), runs each stream accessor in turn against the upstream API
//! ([`orchestrator`]) and merges the bookmarks they return into one state
//! document.

pub mod client;
pub mod config;
pub mod context;
pub mod errors;
pub mod orchestrator;
pub mod output;
pub mod resolve;
pub mod result;
pub mod streams;

pub use errors::{ConfigError, SelectionError, TapError};
pub use orchestrator::{discover, execute_plan, run_sync};
pub use result::{StreamOutcome, SyncOutcome};
