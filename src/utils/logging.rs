use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;
use crate::error::AppError;

/// Install the global tracing subscriber. Only the binary calls this; the
/// library reports through a `DiagnosticSink` instead. Logs go to stderr so
/// stdout stays free for report output.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), AppError> {
    let log_level = settings
        .level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    let env_filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("defi_health_monitor={}", log_level).into())
    };

    let result = match settings.format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).json())
            .try_init(),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).pretty())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).compact())
            .try_init(),
    };

    result.map_err(|e| AppError::InternalError(format!("Failed to initialize logging: {}", e)))?;

    info!(
        "Logging initialized with level: {}, format: {}",
        settings.level, settings.format
    );
    Ok(())
}
