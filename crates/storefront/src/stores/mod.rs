//! Session-backed state stores.
//!
//! Each store wraps one session slot and keeps it in line with the last
//! response from the backend:
//!
//! - [`AuthStore`] holds the logged-in user and their bearer token
//! - [`CartStore`] holds the last server-confirmed cart
//!
//! Stores never mutate authoritative state themselves; every change is a
//! backend call whose response overwrites the slot.

pub mod auth;
pub mod cart;

pub use auth::{AuthStore, NewAccount};
pub use cart::CartStore;

use thiserror::Error;
use venture_market_core::ValidationErrors;

use crate::backend::BackendError;

/// Errors raised by the session stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the session failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Input failed validation before reaching the backend.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The cart line is not in the cart.
    #[error("Cart item not found")]
    ItemNotFound,
}
