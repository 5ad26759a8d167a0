//! Authentication store.
//!
//! Keeps `{user, token}` in the session. The token is re-checked against
//! `GET /users/me` once it is older than the configured revalidation window.

use std::time::Duration;

use chrono::Utc;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use venture_market_core::validation::{validate_login, validate_registration};

use super::StoreError;
use crate::backend::BackendClient;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{AuthState, session_keys};

/// Raw registration form input.
#[derive(Debug, Clone, Copy)]
pub struct NewAccount<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
    pub role: &'a str,
}

/// Session-backed authentication state.
pub struct AuthStore<'a> {
    session: &'a Session,
    backend: &'a BackendClient,
}

impl<'a> AuthStore<'a> {
    #[must_use]
    pub const fn new(session: &'a Session, backend: &'a BackendClient) -> Self {
        Self { session, backend }
    }

    /// Current authentication state, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn state(&self) -> Result<Option<AuthState>, StoreError> {
        Ok(self.session.get(session_keys::AUTH).await?)
    }

    /// Whether a user is logged in.
    pub async fn is_authenticated(&self) -> bool {
        matches!(self.state().await, Ok(Some(_)))
    }

    /// Whether the logged-in user is an entrepreneur.
    pub async fn is_entrepreneur(&self) -> bool {
        matches!(self.state().await, Ok(Some(state)) if state.user.is_entrepreneur())
    }

    /// Whether the logged-in user is a customer.
    pub async fn is_customer(&self) -> bool {
        matches!(self.state().await, Ok(Some(state)) if state.user.is_customer())
    }

    /// Validate credentials, log in against the backend, and store the result.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for malformed input and
    /// `StoreError::Backend` when the backend refuses the credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthState, StoreError> {
        let credentials = validate_login(email, password)?;
        let session = self.backend.login(&credentials).await?;
        let state = AuthState::new(session.user, session.token);

        // New identity, new session id
        self.session.cycle_id().await?;
        self.session.insert(session_keys::AUTH, &state).await?;
        self.session
            .remove::<serde_json::Value>(session_keys::CART)
            .await?;

        set_sentry_user(&state.user.external_id, Some(state.user.email.as_str()));
        info!(user = %state.user.external_id, role = %state.user.role, "User logged in");

        Ok(state)
    }

    /// Register a new account, then log in with it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for malformed input and
    /// `StoreError::Backend` when the backend refuses the registration
    /// (for example a conflicting email).
    #[instrument(skip(self, account), fields(email = %account.email, role = %account.role))]
    pub async fn register(&self, account: NewAccount<'_>) -> Result<AuthState, StoreError> {
        let registration = validate_registration(
            account.name,
            account.email,
            account.password,
            account.password_confirm,
            account.role,
        )?;
        let user = self.backend.register(&registration).await?;
        info!(user = %user.external_id, "User registered");

        self.login(registration.email.as_str(), &registration.password)
            .await
    }

    /// Drop the auth state and cart snapshot and rotate the session id.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), StoreError> {
        self.clear().await?;
        self.session.cycle_id().await?;
        info!("User logged out");
        Ok(())
    }

    /// Re-validate the stored token once it is older than `max_age`.
    ///
    /// A 401 from the backend drops the auth state; any other failure keeps
    /// it so that a backend outage does not log everyone out.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read or written.
    pub async fn initialize(&self, max_age: Duration) -> Result<Option<AuthState>, StoreError> {
        let Some(state) = self.state().await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if !state.needs_revalidation(max_age, now) {
            return Ok(Some(state));
        }

        match self.backend.current_user(&state.token).await {
            Ok(user) => {
                let state = state.refreshed(user, now);
                self.session.insert(session_keys::AUTH, &state).await?;
                Ok(Some(state))
            }
            Err(e) if e.is_unauthorized() => {
                info!(user = %state.user.external_id, "Stored token rejected, clearing auth state");
                self.clear().await?;
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Token revalidation failed, keeping auth state");
                Ok(Some(state))
            }
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.session
            .remove::<serde_json::Value>(session_keys::AUTH)
            .await?;
        self.session
            .remove::<serde_json::Value>(session_keys::CART)
            .await?;
        clear_sentry_user();
        Ok(())
    }
}
