//! Core types for Venture Market.
//!
//! This module provides type-safe wrappers for common domain concepts and the
//! records mirrored from the backend.

pub mod cart;
pub mod catalog;
pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod user;

pub use cart::{Cart, CartItem};
pub use catalog::{Category, Product, Venture, VentureRef};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use role::{Role, RoleError};
pub use user::User;
