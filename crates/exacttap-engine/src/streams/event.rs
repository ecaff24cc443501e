//! Send-event stream.
//!
//! One stream over several upstream event object types. The bookmark is an
//! object keyed by event type, so each type resumes independently:
//! `{"SentEvent": "2024-01-01T00:00:00Z", "OpenEvent": ...}`.

use exacttap_types::catalog::CatalogEntry;
use exacttap_types::error::AccessorError;
use exacttap_types::state::StateScope;
use serde_json::{Map, Value};

use crate::client::{MarketingApi, RetrieveRequest};
use crate::context::SyncContext;
use crate::streams::bookmark::{resume_point, BookmarkTracker};
use crate::streams::object::{pull_and_emit, requested_properties};
use crate::streams::schema::{catalog_entry, FieldSpec, FieldType};

pub const STREAM: &str = "event";
const REPLICATION_KEY: &str = "EventDate";
const KEY_PROPERTIES: &[&str] = &["SendID", "EventType", "SubscriberKey", "EventDate"];

/// Upstream event object types, in sync order, with the `EventType` value
/// stamped on their rows.
pub const EVENT_TYPES: &[(&str, &str)] = &[
    ("SentEvent", "sent"),
    ("ClickEvent", "click"),
    ("OpenEvent", "open"),
    ("BounceEvent", "bounce"),
    ("UnsubEvent", "unsub"),
];

const FIELDS: &[FieldSpec] = &[
    ("SendID", FieldType::Integer),
    ("EventType", FieldType::String),
    ("SubscriberKey", FieldType::String),
    ("EventDate", FieldType::DateTime),
    ("BatchID", FieldType::Integer),
    ("TriggeredSendDefinitionObjectID", FieldType::String),
    ("URL", FieldType::String),
    ("CreatedDate", FieldType::DateTime),
    ("ModifiedDate", FieldType::DateTime),
];

#[must_use]
pub fn catalog_entry_for_events() -> CatalogEntry {
    catalog_entry(STREAM, FIELDS.iter().copied(), KEY_PROPERTIES, Some(REPLICATION_KEY))
}

pub async fn sync<A: MarketingApi>(
    ctx: &mut SyncContext<'_, A>,
    entry: &CatalogEntry,
    scope: &mut StateScope,
) -> Result<u64, AccessorError> {
    ctx.write_schema(entry)?;

    // `EventType` is stamped locally, never requested upstream.
    let properties: Vec<String> = requested_properties(entry, FIELDS.iter().map(|(n, _)| *n))
        .into_iter()
        .filter(|p| p != "EventType")
        .collect();

    let mut bookmarks = match scope.bookmark() {
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            tracing::warn!(stream = STREAM, bookmark = %other, "Ignoring non-object event bookmark");
            Map::new()
        }
        None => Map::new(),
    };

    let mut emitted = 0;
    for (object_type, event_type) in EVENT_TYPES {
        let stored = bookmarks.get(*object_type).and_then(Value::as_str);
        let resumed_at = resume_point(STREAM, stored, ctx.config.start_date);
        let mut tracker = BookmarkTracker::new(REPLICATION_KEY, resumed_at);
        let request =
            RetrieveRequest::new(*object_type, properties.clone()).with_filter(tracker.filter());

        let count = pull_and_emit(ctx, entry, &request, Some(&mut tracker), |row| {
            row.entry("EventType")
                .or_insert_with(|| Value::String((*event_type).to_string()));
        })
        .await?;
        tracing::debug!(stream = STREAM, object_type, records = count, "Synced event type");
        emitted += count;

        if let Some(bookmark) = tracker.into_bookmark() {
            bookmarks.insert((*object_type).to_string(), Value::String(bookmark));
        }
    }

    if !bookmarks.is_empty() {
        scope.set_bookmark(Value::Object(bookmarks));
    }
    Ok(emitted)
}
