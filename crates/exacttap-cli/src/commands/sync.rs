use std::path::Path;

use anyhow::Result;

use exacttap_engine::client::HttpApiClient;
use exacttap_engine::config::parser;
use exacttap_engine::output::JsonLinesSink;
use exacttap_engine::resolve::resolve;
use exacttap_engine::{execute_plan, SyncOutcome, TapError};

/// Execute a sync: validate config and selection, then replicate every
/// selected stream to stdout.
pub async fn execute(config_path: &Path, state_path: Option<&Path>, catalog_path: &Path) -> Result<()> {
    // 1. Everything that can be rejected without the network
    let config = parser::load_config(config_path)?;
    let catalog = parser::load_catalog(catalog_path)?;
    let plan = resolve(&catalog).map_err(TapError::from)?;
    let store = super::state_store(state_path);

    tracing::info!(
        streams = plan.accessors.len(),
        state = ?state_path,
        "Starting sync"
    );

    // 2. Authenticate once, shared by every stream
    let api = HttpApiClient::connect(&config).await.map_err(TapError::Auth)?;

    // 3. Run
    let mut sink = JsonLinesSink::stdout();
    let outcome = execute_plan(&api, &config, plan, store.as_ref(), &mut sink).await?;

    report(&outcome);
    Ok(())
}

fn report(outcome: &SyncOutcome) {
    for stream in &outcome.streams {
        match &stream.error {
            None => tracing::info!(
                stream = stream.stream,
                records = stream.records_emitted(),
                duration_secs = stream.duration_secs,
                "Stream ok"
            ),
            Some(err) => tracing::warn!(
                stream = stream.stream,
                records = stream.records_emitted(),
                category = %err.category,
                retryable = err.retryable,
                "Stream failed: {}",
                err.message
            ),
        }
    }

    let failed = outcome.failed().count();
    if failed == 0 {
        tracing::info!(
            streams = outcome.streams.len(),
            records = outcome.records_emitted(),
            "Sync complete"
        );
    } else {
        tracing::warn!(
            streams = outcome.streams.len(),
            failed,
            records = outcome.records_emitted(),
            "Sync completed with failed streams; they resume from their previous bookmark next run"
        );
    }
}
