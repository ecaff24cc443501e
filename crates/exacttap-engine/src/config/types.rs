//! Typed configuration model.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Keys that must be present and non-null in every config document.
pub const REQUIRED_KEYS: [&str; 2] = ["client_id", "client_secret"];

pub(crate) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub(crate) const DEFAULT_BATCH_SIZE: usize = 2500;

/// Tap configuration, immutable for the duration of a run.
#[derive(Debug, Clone, Deserialize)]
pub struct TapConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Marketing Cloud tenant subdomain. Selects the tenant-specific OAuth
    /// endpoints when set; the legacy global endpoints are used otherwise.
    #[serde(default)]
    pub tenant_subdomain: Option<String>,
    /// Override for the authentication base URL.
    #[serde(default)]
    pub auth_url: Option<String>,
    /// Override for the REST base URL.
    #[serde(default)]
    pub rest_url: Option<String>,
    /// Lower bound for streams that have no bookmark yet.
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Number of subscriber keys looked up per request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Keys this tap does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

#[cfg(test)]
impl TapConfig {
    /// Minimal config for tests.
    pub(crate) fn for_tests() -> Self {
        serde_json::from_value(serde_json::json!({
            "client_id": "x",
            "client_secret": "y"
        }))
        .expect("static test config")
    }
}
