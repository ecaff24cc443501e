//! Bookmark persistence for exacttap.
//!
//! Provides the [`StateStore`] trait, a [`JsonFileStateStore`] for the
//! on-disk state document and a [`MemoryStateStore`] for tests.

#![warn(clippy::pedantic)]

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;

pub use backend::StateStore;
pub use error::StateError;
pub use file::JsonFileStateStore;
pub use memory::MemoryStateStore;
