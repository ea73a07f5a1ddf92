// Gauge skills interview engine
// Main entry point for the gauge binary

use clap::Parser;
use gauge_engine::cli::{Cli, Command, ConfigAction};
use gauge_engine::config::Config;
use gauge_engine::handlers::{
    handle_catalog, handle_config_path, handle_config_show, handle_interview, handle_serve,
    OutputFormat,
};
use gauge_engine::telemetry::{init_telemetry_with_level, resolve_log_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // RUST_LOG still takes precedence over both
    init_telemetry_with_level(&resolve_log_level(
        cli.log.as_deref(),
        &config.core.log_level,
    ));

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Gauge v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Handle commands
    match cli.command {
        Command::Interview { name, level } => {
            tracing::info!("Starting terminal interview...");
            handle_interview(name, level, &config, format).await
        }

        Command::Serve { port } => {
            tracing::info!("Starting API server...");
            handle_serve(config, port).await
        }

        Command::Catalog => handle_catalog(format),

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Path => handle_config_path(cli.config.as_deref(), format),
        },
    }
}
