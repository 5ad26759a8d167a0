//! Marketplace REST backend client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`; the backend is the source of truth
//!   for users, ventures, products, and carts
//! - Authenticated calls carry the user's bearer token
//! - Category and venture listings are cached in memory via `moka` and
//!   invalidated whenever a seller mutates the catalogue
//! - No retries: every failure is terminal for the operation and surfaces to
//!   the user
//!
//! # Example
//!
//! ```rust,ignore
//! use venture_market_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend)?;
//!
//! let session = client.login(&credentials).await?;
//! let cart = client
//!     .add_cart_item(&session.token, product_id, 2)
//!     .await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Token missing, expired, or revoked (401).
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed (403).
    #[error("Forbidden")]
    Forbidden,

    /// Resource not found (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflicting state, e.g. email already registered (409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input rejected by the backend (400/422).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Rate limited by the backend (429).
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("Backend returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },
}

impl BackendError {
    /// Whether the backend rejected the bearer token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Message suitable for showing next to a form, if the backend sent one.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Conflict(msg) | Self::Rejected(msg) if !msg.is_empty() => Some(msg),
            _ => None,
        }
    }
}
