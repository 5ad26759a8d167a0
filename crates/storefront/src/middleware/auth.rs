//! Authentication middleware and extractors.
//!
//! `initialize_auth` runs on every request: it re-validates a stale token
//! against the backend and leaves the current [`AuthState`] in the request
//! extensions. The extractors below read it from there.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::Span;

use crate::models::{AuthState, session_keys};
use crate::state::AppState;
use crate::stores::AuthStore;

/// Middleware that re-validates the stored token and exposes the auth state.
///
/// Session or backend failures never fail the request; the request simply
/// continues as anonymous or with the previous state.
pub async fn initialize_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let store = AuthStore::new(&session, state.backend());
    let auth = match store.initialize(state.config().auth_revalidate_after).await {
        Ok(auth) => auth,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to initialize auth state");
            None
        }
    };

    if let Some(auth) = auth {
        Span::current().record("user_id", auth.user.external_id.to_string());
        request.extensions_mut().insert(auth);
    }

    next.run(request).await
}

/// Look up the auth state: request extensions first, then the session.
async fn current_auth(parts: &Parts) -> Option<AuthState> {
    if let Some(auth) = parts.extensions.get::<AuthState>() {
        return Some(auth.clone());
    }

    let session = parts.extensions.get::<Session>()?;
    session.get(session_keys::AUTH).await.ok().flatten()
}

/// Whether the request came from HTMX or targets a JSON endpoint.
fn wants_status_code(parts: &Parts) -> bool {
    parts.headers.contains_key("hx-request") || parts.uri.path().starts_with("/api/")
}

/// Error returned when authentication or a role is required.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for page requests).
    RedirectToLogin(String),
    /// Unauthorized response (for HTMX and API requests).
    Unauthorized,
    /// Logged in with the wrong role.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(next) => {
                let target = format!("/auth/login?next={}", urlencoding::encode(&next));
                Redirect::to(&target).into_response()
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => {
                (StatusCode::FORBIDDEN, "You are not allowed to view this page").into_response()
            }
        }
    }
}

async fn require_auth(parts: &Parts) -> Result<AuthState, AuthRejection> {
    current_auth(parts).await.ok_or_else(|| {
        if wants_status_code(parts) {
            AuthRejection::Unauthorized
        } else {
            let next = parts
                .uri
                .path_and_query()
                .map_or("/", |pq| pq.as_str())
                .to_string();
            AuthRejection::RedirectToLogin(next)
        }
    })
}

/// Extractor that requires a logged-in user.
///
/// If nobody is logged in, page requests are redirected to the login page
/// and HTMX/API requests get a 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(auth): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.name)
/// }
/// ```
pub struct RequireAuth(pub AuthState);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_auth(parts).await.map(Self)
    }
}

/// Extractor that requires a logged-in entrepreneur (403 for other roles).
pub struct RequireEntrepreneur(pub AuthState);

impl<S> FromRequestParts<S> for RequireEntrepreneur
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = require_auth(parts).await?;
        if auth.user.is_entrepreneur() {
            Ok(Self(auth))
        } else {
            Err(AuthRejection::Forbidden)
        }
    }
}

/// Extractor that requires a logged-in customer (403 for other roles).
pub struct RequireCustomer(pub AuthState);

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = require_auth(parts).await?;
        if auth.user.is_customer() {
            Ok(Self(auth))
        } else {
            Err(AuthRejection::Forbidden)
        }
    }
}

/// Extractor that optionally gets the current auth state.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is
/// logged in.
pub struct OptionalAuth(pub Option<AuthState>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_auth(parts).await))
    }
}
