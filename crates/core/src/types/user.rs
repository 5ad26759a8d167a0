//! User record mirrored from the backend.

use serde::{Deserialize, Serialize};

use super::{Email, Role, UserId};

/// A registered marketplace user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub external_id: UserId,
    pub role: Role,
    pub name: String,
    pub email: Email,
}

impl User {
    /// Whether the user sells through ventures.
    #[must_use]
    pub fn is_entrepreneur(&self) -> bool {
        self.role == Role::Entrepreneur
    }

    /// Whether the user shops with a cart.
    #[must_use]
    pub fn is_customer(&self) -> bool {
        self.role == Role::Customer
    }
}
