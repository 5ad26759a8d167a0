//! Venture Market Core - Shared types library.
//!
//! This crate provides the domain types used by every Venture Market component:
//! - `storefront` - Public-facing marketplace site and seller dashboard
//! - `cli` - Command-line tools for operations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. The external REST backend owns every entity; these records mirror
//! its DTOs so that the storefront can render and validate them.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, prices, roles, and entity records
//! - [`validation`] - Form validation rules applied before calling the backend

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{FieldError, ValidationErrors};
