//! Per-run context shared by every stream accessor.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use exacttap_types::catalog::CatalogEntry;
use exacttap_types::error::AccessorError;
use exacttap_types::message::{Message, Timestamp};

use crate::client::{MarketingApi, Row};
use crate::config::TapConfig;
use crate::output::RecordSink;

/// What an accessor may use while it runs: the shared API session, the
/// run config and the output channel. Counts records per emitted stream.
pub struct SyncContext<'a, A: MarketingApi> {
    pub api: &'a A,
    pub config: &'a TapConfig,
    sink: &'a mut dyn RecordSink,
    counts: BTreeMap<String, u64>,
}

impl<'a, A: MarketingApi> SyncContext<'a, A> {
    pub fn new(api: &'a A, config: &'a TapConfig, sink: &'a mut dyn RecordSink) -> Self {
        Self {
            api,
            config,
            sink,
            counts: BTreeMap::new(),
        }
    }

    /// Announce `entry` with a `SCHEMA` envelope.
    ///
    /// # Errors
    ///
    /// Returns an internal [`AccessorError`] if the sink rejects the write.
    pub fn write_schema(&mut self, entry: &CatalogEntry) -> Result<(), AccessorError> {
        let message = Message::Schema {
            stream: entry.stream.clone(),
            schema: entry.schema.clone(),
            key_properties: entry.key_properties.clone(),
            bookmark_properties: entry.replication_key.iter().cloned().collect(),
        };
        self.emit(&message)
    }

    /// Emit `row` as a `RECORD` of `entry`, shaped by the entry's field
    /// selection.
    ///
    /// # Errors
    ///
    /// Returns an internal [`AccessorError`] if the sink rejects the write.
    pub fn write_record(&mut self, entry: &CatalogEntry, row: &Row) -> Result<(), AccessorError> {
        let message = Message::Record {
            stream: entry.stream.clone(),
            record: entry.schema.project(row),
            time_extracted: Some(Timestamp::new(
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
        };
        self.emit(&message)?;
        *self.counts.entry(entry.stream.clone()).or_insert(0) += 1;
        Ok(())
    }

    pub fn into_counts(self) -> BTreeMap<String, u64> {
        self.counts
    }

    fn emit(&mut self, message: &Message) -> Result<(), AccessorError> {
        self.sink
            .emit(message)
            .map_err(|e| AccessorError::internal("EMIT_FAILED", e.to_string()))
    }
}
