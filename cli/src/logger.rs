use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logger configuration for the compiler's command-line entry point.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Include target module paths in console output.
    pub include_targets: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), include_targets: false }
    }
}

impl LoggerConfig {
    pub fn verbose() -> Self {
        Self { level: "debug".to_string(), include_targets: true }
    }
}

/// Initializes the global `tracing` subscriber the CLI runs under.
///
/// `Diagnostics` (in the core crate) is what actually prefixes messages with
/// the input line number; this only controls how the resulting events reach
/// the console.
pub struct UnifiedLogger;

impl UnifiedLogger {
    pub fn init(config: LoggerConfig) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

        let console_layer = fmt::layer().with_target(config.include_targets).with_ansi(true).without_time();

        let subscriber = tracing_subscriber::registry().with(filter).with(console_layer);

        tracing::subscriber::set_global_default(subscriber)?;
        Ok(())
    }
}
