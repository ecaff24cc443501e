//! Tap configuration: typed model, file parsing and validation.

pub mod parser;
pub mod types;
pub mod validator;

pub use types::TapConfig;
