//! Venture Market Storefront library.
//!
//! Server-rendered storefront for the Venture Market marketplace: catalogue
//! browsing, customer carts, and the seller dashboard, all backed by the
//! marketplace REST API. Provided as a library so the router can be tested
//! in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod stores;
