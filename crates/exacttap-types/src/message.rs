//! Output envelopes.
//!
//! Every line the tap writes to its output channel is one [`Message`]:
//! a `SCHEMA` announcing a stream, a `RECORD` carrying one row, or a
//! `STATE` checkpoint carrying the bookmark document.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::Schema;
use crate::state::State;

/// `time_extracted` value of a record, an RFC 3339 UTC string.
///
/// The engine formats it when the record is written; it is carried here
/// unparsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    #[must_use]
    pub fn new(iso8601: impl Into<String>) -> Self {
        Self(iso8601.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of tap output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Announces the shape of a stream before its records.
    Schema {
        stream: String,
        schema: Schema,
        key_properties: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// A single replicated row.
    Record {
        stream: String,
        record: Map<String, Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_extracted: Option<Timestamp>,
    },
    /// Checkpoint of the full bookmark document.
    State { value: State },
}

impl Message {
    /// Stream this message belongs to (`None` for `STATE`).
    #[must_use]
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }
}
