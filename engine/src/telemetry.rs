//! Telemetry and Observability
//!
//! Sets up `tracing-subscriber` for structured logging: pretty output in
//! debug builds, JSON in release builds.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Pick the effective log level.
///
/// The `--log` flag wins over the config file, which wins over "info".
/// `RUST_LOG` overrides both inside [`init_telemetry_with_level`].
pub fn resolve_log_level(cli_level: Option<&str>, config_level: &str) -> String {
    cli_level
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .or_else(|| Some(config_level.trim()).filter(|level| !level.is_empty()))
        .unwrap_or("info")
        .to_string()
}

/// Initialize the tracing subscriber with the given log level.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter.
/// Only the first call installs a subscriber; later calls are no-ops.
pub fn init_telemetry_with_level(log_level: &str) {
    let default_filter = format!("{},gauge_engine={}", log_level, log_level);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(false))
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .ok();
    }
}
