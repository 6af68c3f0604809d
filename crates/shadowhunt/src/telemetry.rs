//! Tracing setup for binaries.

use tracing_subscriber::EnvFilter;

use crate::ShadowhuntError;

/// Installs a `fmt` subscriber as the global default.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used (for
/// example `"info"` or `"shadowhunt_session=debug,info"`). Fails if a
/// global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> Result<(), ShadowhuntError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| ShadowhuntError::Telemetry(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| ShadowhuntError::Telemetry(e.to_string()))
}
