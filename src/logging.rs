//! Logging setup for the training CLI.
//!
//! Installs a global tracing subscriber that writes human-readable events to
//! stderr. Verbosity is controlled through `SIESTA_LOG` (same syntax as
//! `RUST_LOG`), defaulting to `info`.

use tracing_subscriber::EnvFilter;

/// Environment variable used to override the log filter.
pub const LOG_FILTER_ENV: &str = "SIESTA_LOG";

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to set the global tracing subscriber.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global stderr subscriber. Call once, early in `main`.
pub fn init() -> Result<(), LoggingError> {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
