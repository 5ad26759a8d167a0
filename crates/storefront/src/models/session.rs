//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use venture_market_core::User;

/// Session-stored authentication state.
///
/// Holds the backend bearer token alongside the user it belongs to, and the
/// last time the token was confirmed by `GET /users/me`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthState {
    /// The logged-in user, as last reported by the backend.
    pub user: User,
    /// Backend bearer token.
    #[serde(serialize_with = "expose_token", deserialize_with = "wrap_token")]
    pub token: SecretString,
    /// When the backend last confirmed the token.
    pub validated_at: DateTime<Utc>,
}

impl AuthState {
    /// Fresh state for a token the backend just issued.
    #[must_use]
    pub fn new(user: User, token: SecretString) -> Self {
        Self {
            user,
            token,
            validated_at: Utc::now(),
        }
    }

    /// Whether the token should be re-checked against the backend.
    #[must_use]
    pub fn needs_revalidation(&self, max_age: std::time::Duration, now: DateTime<Utc>) -> bool {
        (now - self.validated_at)
            .to_std()
            .is_ok_and(|age| age >= max_age)
    }

    /// Record a successful re-validation.
    pub fn refreshed(self, user: User, now: DateTime<Utc>) -> Self {
        Self {
            user,
            validated_at: now,
            ..self
        }
    }
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .field("validated_at", &self.validated_at)
            .finish()
    }
}

fn expose_token<S: Serializer>(token: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(token.expose_secret())
}

fn wrap_token<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Session keys.
pub mod keys {
    /// Key for the authentication state.
    pub const AUTH: &str = "auth";

    /// Key for the last server-confirmed cart.
    pub const CART: &str = "cart";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn user() -> User {
        serde_json::from_value(json!({
            "externalId": "aaaaaaaa-aaaa-4aaa-8aaa-aaaaaaaaaaaa",
            "role": "CUSTOMER",
            "name": "Ana",
            "email": "ana@example.com"
        }))
        .unwrap()
    }

    #[test]
    fn test_token_survives_session_serialization() {
        let state = AuthState::new(user(), SecretString::from("tok-9"));
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["token"], json!("tok-9"));

        let back: AuthState = serde_json::from_value(value).unwrap();
        assert_eq!(back.token.expose_secret(), "tok-9");
        assert_eq!(back.user, state.user);
    }

    #[test]
    fn test_debug_redacts_token() {
        let state = AuthState::new(user(), SecretString::from("tok-9"));
        let debug = format!("{state:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("tok-9"));
    }

    #[test]
    fn test_needs_revalidation() {
        let state = AuthState::new(user(), SecretString::from("t"));
        let max_age = std::time::Duration::from_secs(300);
        let now = state.validated_at;

        assert!(!state.needs_revalidation(max_age, now + Duration::seconds(299)));
        assert!(state.needs_revalidation(max_age, now + Duration::seconds(300)));

        let later = now + Duration::seconds(600);
        let refreshed = state.refreshed(user(), later);
        assert!(!refreshed.needs_revalidation(max_age, later));
    }
}
