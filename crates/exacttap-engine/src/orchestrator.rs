//! Discovery and sync orchestration.
//!
//! Sync runs accessors one after another. Each accessor gets a scope over
//! its own bookmark; a successful accessor's scope is merged into the run
//! state and checkpointed, a failed one's is dropped. State is persisted
//! exactly once, after the last accessor.

use std::time::Instant;

use exacttap_state::StateStore;
use exacttap_types::catalog::Catalog;
use exacttap_types::message::Message;

use crate::client::MarketingApi;
use crate::config::TapConfig;
use crate::context::SyncContext;
use crate::errors::TapError;
use crate::output::RecordSink;
use crate::resolve::{resolve, ExecutionPlan};
use crate::result::{StreamOutcome, SyncOutcome};
use crate::streams::REGISTRY;

/// Build the full catalog, kind by kind in registry order.
///
/// # Errors
///
/// Returns [`TapError::Discovery`] naming the first kind whose discovery
/// failed.
pub async fn discover<A: MarketingApi>(api: &A, select_all: bool) -> Result<Catalog, TapError> {
    tracing::info!(select_all, "Starting discovery");
    let mut streams = Vec::new();

    for kind in REGISTRY {
        let entries = kind
            .generate_catalog(api)
            .await
            .map_err(|source| TapError::Discovery {
                stream: kind.name(),
                source,
            })?;
        tracing::debug!(stream = kind.name(), entries = entries.len(), "Discovered");
        streams.extend(entries);
    }

    if select_all {
        for entry in &mut streams {
            entry.schema.select_all();
        }
    }

    tracing::info!(streams = streams.len(), "Discovery complete");
    Ok(Catalog { streams })
}

/// Resolve `catalog` and run the resulting plan.
///
/// # Errors
///
/// See [`resolve`] and [`execute_plan`].
pub async fn run_sync<A: MarketingApi>(
    api: &A,
    config: &TapConfig,
    catalog: &Catalog,
    store: &dyn StateStore,
    sink: &mut dyn RecordSink,
) -> Result<SyncOutcome, TapError> {
    let plan = resolve(catalog)?;
    execute_plan(api, config, plan, store, sink).await
}

/// Run every accessor of `plan` in order.
///
/// Accessor failures are recorded in the returned outcome and never abort
/// the run.
///
/// # Errors
///
/// Returns [`TapError::State`] if state cannot be loaded or saved, and
/// [`TapError::Output`] if a checkpoint cannot be written. State is saved
/// before an output error is reported.
pub async fn execute_plan<A: MarketingApi>(
    api: &A,
    config: &TapConfig,
    plan: ExecutionPlan,
    store: &dyn StateStore,
    sink: &mut dyn RecordSink,
) -> Result<SyncOutcome, TapError> {
    let mut state = store.load()?;
    tracing::info!(
        streams = plan.accessors.len(),
        bookmarks = state.len(),
        "Starting sync"
    );

    let mut outcomes = Vec::with_capacity(plan.accessors.len());
    let mut output_error = None;

    for accessor in &plan.accessors {
        let stream = accessor.stream_name();
        let mut scope = state.scope(&stream);
        tracing::info!(
            stream = %stream,
            kind = %accessor.kind(),
            bookmark = ?scope.bookmark(),
            "Syncing stream"
        );

        let started = Instant::now();
        let mut ctx = SyncContext::new(api, config, &mut *sink);
        let result = accessor.sync(&mut ctx, &mut scope).await;
        let records = ctx.into_counts();
        let duration_secs = started.elapsed().as_secs_f64();

        let error = match result {
            Ok(emitted) => {
                let changed = state.apply(scope);
                tracing::info!(
                    stream = %stream,
                    records = emitted,
                    bookmark_changed = changed,
                    duration_secs,
                    "Stream synced"
                );
                if let Err(e) = sink.emit(&Message::State {
                    value: state.clone(),
                }) {
                    output_error = Some(e);
                }
                None
            }
            Err(err) => {
                tracing::error!(
                    stream = %stream,
                    category = %err.category,
                    code = err.code,
                    retryable = err.retryable,
                    details = ?err.details,
                    "Stream failed, continuing with remaining streams: {}",
                    err.message
                );
                Some(err)
            }
        };

        outcomes.push(StreamOutcome {
            stream: stream.to_string(),
            kind: accessor.kind(),
            records,
            duration_secs,
            error,
        });

        if output_error.is_some() {
            break;
        }
    }

    let flushed = sink.flush();
    store.save(&state)?;
    tracing::debug!(bookmarks = state.len(), "Persisted state");

    if let Some(err) = output_error.or(flushed.err()) {
        return Err(TapError::Output(err));
    }

    Ok(SyncOutcome {
        streams: outcomes,
        skipped: plan.skipped,
        state,
    })
}
