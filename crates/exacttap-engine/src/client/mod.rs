//! Upstream API surface used by the stream accessors.
//!
//! [`MarketingApi`] is the only seam between the engine and the network:
//! every accessor pulls rows through [`MarketingApi::retrieve`]. The
//! production implementation is [`http::HttpApiClient`].

pub mod http;

use exacttap_types::error::AccessorError;
use serde::Serialize;
use serde_json::{Map, Value};

pub use http::HttpApiClient;

/// One upstream row.
pub type Row = Map<String, Value>;

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    GreaterThanOrEqual,
    In,
}

/// Simple property filter understood by the retrieve endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub property: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl Filter {
    /// `property >= since`.
    #[must_use]
    pub fn since(property: impl Into<String>, since: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            operator: FilterOperator::GreaterThanOrEqual,
            value: Value::String(since.into()),
        }
    }

    /// `property IN values`.
    #[must_use]
    pub fn one_of<I, S>(property: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            property: property.into(),
            operator: FilterOperator::In,
            value: Value::Array(values.into_iter().map(|v| Value::String(v.into())).collect()),
        }
    }
}

/// Request for all rows of one upstream object type.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieveRequest {
    pub object_type: String,
    pub properties: Vec<String>,
    pub filter: Option<Filter>,
}

impl RetrieveRequest {
    #[must_use]
    pub fn new(object_type: impl Into<String>, properties: Vec<String>) -> Self {
        Self {
            object_type: object_type.into(),
            properties,
            filter: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Option<Filter>) -> Self {
        self.filter = filter;
        self
    }
}

/// Upstream marketing API.
///
/// Implementations own authentication and pagination; callers get every
/// matching row in upstream order.
#[allow(async_fn_in_trait)]
pub trait MarketingApi {
    async fn retrieve(&self, request: &RetrieveRequest) -> Result<Vec<Row>, ApiError>;
}

/// Upstream call failure.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("request failed: {message}")]
    Transport { message: String, timeout: bool },

    /// The upstream answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        status: u16,
        body: String,
        retry_after_ms: Option<u64>,
    },

    /// The response body was not what the endpoint promises.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<ApiError> for AccessorError {
    fn from(err: ApiError) -> Self {
        let message = err.to_string();
        match err {
            ApiError::Transport { timeout: true, .. } => {
                AccessorError::transient_network("TIMEOUT", message)
            }
            ApiError::Transport { .. } => AccessorError::transient_network("REQUEST_FAILED", message),
            ApiError::Status { status: 401 | 403, .. } => {
                AccessorError::auth("UNAUTHORIZED", message)
            }
            ApiError::Status {
                status: 429,
                retry_after_ms,
                ..
            } => AccessorError::rate_limit("THROTTLED", message, retry_after_ms),
            ApiError::Status { status, .. } if status >= 500 => {
                AccessorError::transient_network(format!("HTTP_{status}"), message)
            }
            ApiError::Status { status, .. } => AccessorError::api(format!("HTTP_{status}"), message),
            ApiError::Decode(_) => AccessorError::data("BAD_RESPONSE", message),
        }
    }
}
