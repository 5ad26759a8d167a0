//! Cache types for backend catalogue responses.

use venture_market_core::{Category, Venture};

/// Cache key for catalogue listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Ventures,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
    Ventures(Vec<Venture>),
}
