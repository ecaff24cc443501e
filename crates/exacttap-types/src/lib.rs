//! Shared catalog, state, message and error types for exacttap.
//!
//! This crate carries no I/O and is safe to depend on from every other crate
//! in the workspace.

pub mod catalog;
pub mod error;
pub mod message;
pub mod state;
