mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "exacttap",
    version,
    about = "Replicate marketing-cloud objects as SCHEMA/RECORD/STATE messages"
)]
struct Cli {
    /// Path to the config JSON file
    #[arg(short, long)]
    config: PathBuf,

    /// Path to the state JSON file; read at start, rewritten at the end
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Path to the catalog JSON file selecting streams to sync
    #[arg(short, long, visible_alias = "catalog")]
    properties: Option<PathBuf>,

    /// Print the catalog of available streams instead of syncing
    #[arg(short, long)]
    discover: bool,

    /// With --discover, mark every stream and field selected
    #[arg(short = 'S', long)]
    select_all: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    let result = if cli.discover {
        commands::discover::execute(&cli.config, cli.state.as_deref(), cli.select_all).await
    } else if let Some(catalog) = &cli.properties {
        commands::sync::execute(&cli.config, cli.state.as_deref(), catalog).await
    } else {
        tracing::info!("No properties were selected");
        Ok(())
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            tracing::error!("Run failed.");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn short_flags() {
        let cli = Cli::try_parse_from([
            "exacttap", "-c", "config.json", "-s", "state.json", "-p", "catalog.json",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.state, Some(PathBuf::from("state.json")));
        assert_eq!(cli.properties, Some(PathBuf::from("catalog.json")));
        assert!(!cli.discover);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn catalog_alias_and_discover_flags() {
        let cli = Cli::try_parse_from([
            "exacttap", "--config", "c.json", "--catalog", "cat.json", "-d", "-S",
        ])
        .unwrap();
        assert_eq!(cli.properties, Some(PathBuf::from("cat.json")));
        assert!(cli.discover);
        assert!(cli.select_all);
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["exacttap", "--discover"]).is_err());
    }
}
