//! Sync run result types.

use std::collections::BTreeMap;

use exacttap_types::error::AccessorError;
use exacttap_types::state::State;

use crate::resolve::SkipReason;
use crate::streams::StreamKind;

/// Outcome of one accessor.
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    pub stream: String,
    pub kind: StreamKind,
    /// Records emitted per stream; a carrier also counts its folded streams.
    pub records: BTreeMap<String, u64>,
    pub duration_secs: f64,
    /// Set when the accessor failed. Records emitted before the failure
    /// are still counted.
    pub error: Option<AccessorError>,
}

impl StreamOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    #[must_use]
    pub fn records_emitted(&self) -> u64 {
        self.records.values().sum()
    }
}

/// Result of a sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub streams: Vec<StreamOutcome>,
    pub skipped: Vec<(String, SkipReason)>,
    /// State as persisted at the end of the run.
    pub state: State,
}

impl SyncOutcome {
    /// Whether any accessor failed.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.streams.iter().any(|s| !s.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &StreamOutcome> {
        self.streams.iter().filter(|s| !s.succeeded())
    }

    #[must_use]
    pub fn records_emitted(&self) -> u64 {
        self.streams.iter().map(StreamOutcome::records_emitted).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(stream: &str, records: u64, error: Option<AccessorError>) -> StreamOutcome {
        StreamOutcome {
            stream: stream.into(),
            kind: StreamKind::Email,
            records: BTreeMap::from([(stream.to_string(), records)]),
            duration_secs: 0.0,
            error,
        }
    }

    #[test]
    fn degraded_when_any_stream_failed() {
        let mut sync = SyncOutcome {
            streams: vec![outcome("email", 3, None)],
            ..SyncOutcome::default()
        };
        assert!(!sync.is_degraded());

        sync.streams
            .push(outcome("send", 1, Some(AccessorError::api("HTTP_400", "bad"))));
        assert!(sync.is_degraded());
        assert_eq!(sync.failed().count(), 1);
        assert_eq!(sync.records_emitted(), 4);
    }
}
