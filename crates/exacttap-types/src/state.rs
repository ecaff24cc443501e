//! Replication state model.
//!
//! [`State`] maps stream names to opaque bookmark values. The orchestrator
//! owns the canonical [`State`]; each accessor only ever sees a
//! [`StateScope`] for its own stream and hands it back when done, so writes
//! from different accessors land on disjoint keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque stream name (e.g. `"email"`, `"data_extension.customers"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamName(String);

impl StreamName {
    /// Create a new stream name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StreamName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Into<String>> From<S> for StreamName {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

// ---------------------------------------------------------------------------
// State document
// ---------------------------------------------------------------------------

/// Bookmark document: stream name to bookmark value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(BTreeMap<StreamName, Value>);

impl State {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current bookmark for `stream`, if any.
    #[must_use]
    pub fn bookmark(&self, stream: &StreamName) -> Option<&Value> {
        self.0.get(stream)
    }

    /// Hand out a scoped view of a single stream's bookmark.
    #[must_use]
    pub fn scope(&self, stream: &StreamName) -> StateScope {
        StateScope {
            stream: stream.clone(),
            bookmark: self.0.get(stream).cloned(),
            touched: false,
        }
    }

    /// Merge a returned scope back in.
    ///
    /// Only the scope's own key is written, and only if the accessor touched
    /// it. Returns whether the document changed.
    pub fn apply(&mut self, scope: StateScope) -> bool {
        let StateScope {
            stream,
            bookmark,
            touched,
        } = scope;
        match bookmark {
            Some(value) if touched => self.0.insert(stream, value.clone()).as_ref() != Some(&value),
            _ => false,
        }
    }

    pub fn streams(&self) -> impl Iterator<Item = &StreamName> {
        self.0.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(StreamName, Value)> for State {
    fn from_iter<I: IntoIterator<Item = (StreamName, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One stream's slice of [`State`], lent to the accessor for that stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StateScope {
    stream: StreamName,
    bookmark: Option<Value>,
    touched: bool,
}

impl StateScope {
    /// Stream this scope belongs to.
    #[must_use]
    pub fn stream(&self) -> &StreamName {
        &self.stream
    }

    /// Bookmark as it was when the scope was handed out, or as last set.
    #[must_use]
    pub fn bookmark(&self) -> Option<&Value> {
        self.bookmark.as_ref()
    }

    /// Bookmark as a string, when it is one.
    #[must_use]
    pub fn bookmark_str(&self) -> Option<&str> {
        self.bookmark.as_ref().and_then(Value::as_str)
    }

    /// Replace the bookmark for this stream.
    pub fn set_bookmark(&mut self, value: Value) {
        self.bookmark = Some(value);
        self.touched = true;
    }
}
