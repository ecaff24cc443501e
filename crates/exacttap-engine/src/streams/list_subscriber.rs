//! List membership stream, carrier for folded subscriber replication.
//!
//! When the subscriber stream is folded in, every distinct `SubscriberKey`
//! seen in this run's list memberships is looked up in batches of
//! `batch_size` and emitted as a `subscriber` record.

use std::collections::BTreeSet;

use exacttap_types::catalog::CatalogEntry;
use exacttap_types::error::AccessorError;
use exacttap_types::state::StateScope;
use serde_json::Value;

use crate::client::{Filter, MarketingApi, RetrieveRequest};
use crate::context::SyncContext;
use crate::streams::object::{
    pull_and_emit, replicate, requested_properties, LIST_SUBSCRIBER, SUBSCRIBER,
};

const JOIN_KEY: &str = "SubscriberKey";

pub async fn sync<A: MarketingApi>(
    ctx: &mut SyncContext<'_, A>,
    entry: &CatalogEntry,
    subscriber: Option<&CatalogEntry>,
    scope: &mut StateScope,
) -> Result<u64, AccessorError> {
    ctx.write_schema(entry)?;
    if let Some(subscriber) = subscriber {
        ctx.write_schema(subscriber)?;
    }

    let mut keys = BTreeSet::new();
    let mut emitted = replicate(
        ctx,
        entry,
        LIST_SUBSCRIBER.object_type,
        requested_properties(entry, LIST_SUBSCRIBER.field_names()),
        entry
            .replication_key
            .as_deref()
            .or(LIST_SUBSCRIBER.replication_key),
        scope,
        |row| {
            if subscriber.is_some() {
                if let Some(key) = row.get(JOIN_KEY).and_then(Value::as_str) {
                    keys.insert(key.to_string());
                }
            }
        },
    )
    .await?;

    if let Some(subscriber) = subscriber {
        emitted += sync_subscribers(ctx, subscriber, &keys).await?;
    }
    Ok(emitted)
}

async fn sync_subscribers<A: MarketingApi>(
    ctx: &mut SyncContext<'_, A>,
    entry: &CatalogEntry,
    keys: &BTreeSet<String>,
) -> Result<u64, AccessorError> {
    let properties = requested_properties(entry, SUBSCRIBER.field_names());
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    let batch_size = ctx.config.batch_size.max(1);

    let mut emitted = 0;
    for batch in keys.chunks(batch_size) {
        let request = RetrieveRequest::new(SUBSCRIBER.object_type, properties.clone())
            .with_filter(Some(Filter::one_of(JOIN_KEY, batch.iter().copied())));
        emitted += pull_and_emit(ctx, entry, &request, None, |_| {}).await?;
    }
    tracing::debug!(
        stream = entry.stream,
        subscriber_keys = keys.len(),
        records = emitted,
        "Synced folded subscribers"
    );
    Ok(emitted)
}
