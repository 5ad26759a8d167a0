//! Backend connectivity check.
//!
//! # Environment Variables
//!
//! - `BACKEND_API_URL` - Base URL of the marketplace REST backend
//! - `BACKEND_TIMEOUT_SECS` - Request timeout (default: 10)

use std::time::Instant;

use venture_market_storefront::backend::{BackendClient, BackendError};
use venture_market_storefront::config::{BackendConfig, ConfigError};

/// Errors from commands that talk to the backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendCommandError {
    /// Backend settings are missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Build a client from the environment.
pub(crate) fn client() -> Result<(BackendClient, BackendConfig), BackendCommandError> {
    let config = BackendConfig::from_env()?;
    let client = BackendClient::new(&config)?;
    Ok((client, config))
}

/// Probe the backend and log the round-trip time.
///
/// # Errors
///
/// Returns an error if the backend is unreachable or answers with an error
/// status.
pub async fn ping() -> Result<(), BackendCommandError> {
    let (client, config) = client()?;

    tracing::info!("Pinging {}...", config.api_url);
    let started = Instant::now();
    client.ping().await?;

    tracing::info!(
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Backend is reachable"
    );
    Ok(())
}
