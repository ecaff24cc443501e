//! Replication-key tracking for incremental reads.
//!
//! `BookmarkTracker` keeps the highest replication-key timestamp seen in a
//! stream's rows, starting from the point the sync resumed at.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::client::{Filter, Row};

/// Parse an upstream timestamp.
///
/// Accepts RFC 3339, and offset-less `YYYY-MM-DDTHH:MM:SS[.fff]` which is
/// read as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Canonical bookmark representation (`2024-01-01T00:00:00Z`).
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Where a sync starts: the stored bookmark if it parses, otherwise the
/// configured start date.
#[must_use]
pub fn resume_point(
    stream: &str,
    bookmark: Option<&str>,
    start_date: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match bookmark {
        Some(raw) => match parse_timestamp(raw) {
            Some(ts) => Some(ts),
            None => {
                tracing::warn!(
                    stream,
                    bookmark = raw,
                    "Ignoring unparseable bookmark, falling back to start_date"
                );
                start_date
            }
        },
        None => start_date,
    }
}

/// Tracks the maximum replication-key value observed during a read.
#[derive(Debug, Clone)]
pub struct BookmarkTracker {
    field: String,
    resumed_at: Option<DateTime<Utc>>,
    max: Option<DateTime<Utc>>,
}

impl BookmarkTracker {
    pub fn new(field: impl Into<String>, resumed_at: Option<DateTime<Utc>>) -> Self {
        Self {
            field: field.into(),
            resumed_at,
            max: resumed_at,
        }
    }

    /// `field >= resume point`, or `None` for a full read.
    #[must_use]
    pub fn filter(&self) -> Option<Filter> {
        self.resumed_at
            .map(|ts| Filter::since(self.field.clone(), format_timestamp(ts)))
    }

    /// Record the row's replication-key value. Updates max if larger.
    /// Rows without a parseable value are ignored.
    pub fn observe(&mut self, row: &Row) {
        let Some(ts) = row
            .get(&self.field)
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
        else {
            return;
        };
        match self.max {
            Some(current) if ts <= current => {}
            _ => self.max = Some(ts),
        }
    }

    /// Consume the tracker, yielding the new bookmark if there is one.
    #[must_use]
    pub fn into_bookmark(self) -> Option<String> {
        self.max.map(format_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn row(value: Value) -> Row {
        json!({"ModifiedDate": value}).as_object().cloned().unwrap()
    }

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339_and_naive() {
        assert_eq!(parse_timestamp("2024-01-01T00:00:00Z"), Some(utc(2024, 1, 1)));
        assert_eq!(
            parse_timestamp("2024-01-01T02:00:00+02:00"),
            Some(utc(2024, 1, 1))
        );
        assert_eq!(parse_timestamp("2024-01-01T00:00:00.000"), Some(utc(2024, 1, 1)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn format_is_utc_z() {
        assert_eq!(format_timestamp(utc(2024, 3, 5)), "2024-03-05T00:00:00Z");
    }

    #[test]
    fn tracks_maximum() {
        let mut tracker = BookmarkTracker::new("ModifiedDate", None);
        tracker.observe(&row(json!("2024-02-01T00:00:00Z")));
        tracker.observe(&row(json!("2024-03-01T00:00:00Z")));
        tracker.observe(&row(json!("2024-01-01T00:00:00Z")));
        tracker.observe(&row(json!(null)));
        assert_eq!(tracker.into_bookmark().as_deref(), Some("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn never_moves_before_resume_point() {
        let mut tracker = BookmarkTracker::new("ModifiedDate", Some(utc(2024, 6, 1)));
        tracker.observe(&row(json!("2024-01-01T00:00:00Z")));
        assert_eq!(tracker.into_bookmark().as_deref(), Some("2024-06-01T00:00:00Z"));
    }

    #[test]
    fn no_rows_no_start_no_bookmark() {
        let tracker = BookmarkTracker::new("ModifiedDate", None);
        assert!(tracker.filter().is_none());
        assert!(tracker.into_bookmark().is_none());
    }

    #[test]
    fn filter_uses_resume_point() {
        let tracker = BookmarkTracker::new("ModifiedDate", Some(utc(2024, 6, 1)));
        assert_eq!(
            tracker.filter(),
            Some(Filter::since("ModifiedDate", "2024-06-01T00:00:00Z"))
        );
    }

    #[test]
    fn bad_bookmark_falls_back_to_start_date() {
        assert_eq!(
            resume_point("email", Some("garbage"), Some(utc(2024, 1, 1))),
            Some(utc(2024, 1, 1))
        );
        assert_eq!(
            resume_point("email", Some("2024-05-01T00:00:00Z"), Some(utc(2024, 1, 1))),
            Some(utc(2024, 5, 1))
        );
        assert_eq!(resume_point("email", None, None), None);
    }
}
