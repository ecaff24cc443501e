use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use exacttap_engine::client::HttpApiClient;
use exacttap_engine::config::parser;
use exacttap_engine::{discover, TapError};

/// Execute discovery: authenticate, build the catalog and print it to stdout
/// as one JSON document.
pub async fn execute(config_path: &Path, state_path: Option<&Path>, select_all: bool) -> Result<()> {
    // 1. Load and validate config
    let config = parser::load_config(config_path)?;

    // 2. State is not used by discovery, but an unreadable file is still an error
    let state = super::state_store(state_path).load()?;
    tracing::debug!(bookmarks = state.len(), "Loaded state");

    // 3. Authenticate and discover
    let api = HttpApiClient::connect(&config).await.map_err(TapError::Auth)?;
    let catalog = discover(&api, select_all).await?;

    // 4. Print machine-readable catalog
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer(&mut stdout, &catalog).context("Failed to write catalog")?;
    writeln!(stdout).context("Failed to write catalog")?;
    stdout.flush()?;

    tracing::info!(streams = catalog.streams.len(), "Finished discovery");
    Ok(())
}
