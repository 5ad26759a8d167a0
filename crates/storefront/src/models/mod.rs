//! Session models for the storefront.

pub mod session;

pub use session::{AuthState, keys as session_keys};
