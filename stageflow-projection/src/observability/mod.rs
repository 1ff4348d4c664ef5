//! Tracing subscriber setup.

use crate::config::{LogFormat, ProjectionConfig};
use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns false if a
/// global subscriber was already installed, which is not an error.
pub fn init_tracing(default_filter: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .try_init(),
    };

    if let Err(err) = installed {
        tracing::debug!(error = %err, "Tracing subscriber already installed");
        return false;
    }
    true
}

/// Installs the subscriber described by `config`.
pub fn init_from_config(config: &ProjectionConfig) -> bool {
    init_tracing(&config.log_filter, config.log_format)
}
