//! Marketplace roles.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleError(pub String);

/// The role a user registered with.
///
/// Entrepreneurs own ventures and list products; customers keep a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Entrepreneur,
    Customer,
}

impl Role {
    /// Wire and form value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Entrepreneur => "ENTREPRENEUR",
            Self::Customer => "CUSTOMER",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Entrepreneur => "Entrepreneur",
            Self::Customer => "Customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ENTREPRENEUR" => Ok(Self::Entrepreneur),
            "CUSTOMER" => Ok(Self::Customer),
            _ => Err(RoleError(s.to_string())),
        }
    }
}
