//! Authentication route handlers.
//!
//! Handles login, registration, and logout against the backend's user
//! endpoints. Forms are re-rendered with field messages on failure.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use venture_market_core::Role;

use crate::backend::BackendError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::models::AuthState;
use crate::routes::views::{FormErrors, NavView, flash_message, safe_redirect};
use crate::state::AppState;
use crate::stores::{AuthStore, NewAccount, StoreError};

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub role: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// A role choice in the registration form.
#[derive(Clone)]
pub struct RoleOption {
    pub value: &'static str,
    pub label: &'static str,
    pub checked_attr: &'static str,
}

impl RoleOption {
    fn list(selected: &str) -> Vec<Self> {
        let selected: Option<Role> = selected.parse().ok();
        [Role::Customer, Role::Entrepreneur]
            .into_iter()
            .map(|role| Self {
                value: role.as_str(),
                label: role.label(),
                checked_attr: if selected == Some(role) { "checked" } else { "" },
            })
            .collect()
    }
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub email: String,
    pub next: String,
    pub errors: FormErrors,
    pub success: Option<&'static str>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleOption>,
    pub errors: FormErrors,
}

// =============================================================================
// Helpers
// =============================================================================

/// Where to go after logging in.
fn landing_page(auth: &AuthState, next: Option<&str>) -> String {
    safe_redirect(next).map_or_else(
        || {
            if auth.user.is_entrepreneur() {
                "/dashboard".to_string()
            } else {
                "/".to_string()
            }
        },
        ToString::to_string,
    )
}

/// Turn a store failure into form messages and a status, or a hard error.
fn form_failure(
    err: StoreError,
    unauthorized_message: &str,
) -> Result<(StatusCode, FormErrors), AppError> {
    match err {
        StoreError::Validation(errors) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            FormErrors::from(&errors),
        )),
        StoreError::Backend(BackendError::Unauthorized) => Ok((
            StatusCode::UNAUTHORIZED,
            FormErrors::form(unauthorized_message),
        )),
        StoreError::Backend(ref e @ (BackendError::Conflict(_) | BackendError::Rejected(_))) => {
            let status = if matches!(e, BackendError::Conflict(_)) {
                StatusCode::CONFLICT
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            let message = e
                .user_message()
                .unwrap_or("The details were rejected, please check them")
                .to_string();
            Ok((status, FormErrors::form(message)))
        }
        other => Err(other.into()),
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<LoginQuery>,
) -> Response {
    if let Some(auth) = auth {
        return Redirect::to(&landing_page(&auth, query.next.as_deref())).into_response();
    }

    let errors = query
        .error
        .as_deref()
        .and_then(flash_message)
        .map(FormErrors::form)
        .unwrap_or_default();

    LoginTemplate {
        nav: NavView::default(),
        nonce,
        email: String::new(),
        next: safe_redirect(query.next.as_deref()).unwrap_or_default().to_string(),
        errors,
        success: query.success.as_deref().and_then(flash_message),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, nonce, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let store = AuthStore::new(&session, state.backend());

    match store.login(&form.email, &form.password).await {
        Ok(auth) => Ok(Redirect::to(&landing_page(&auth, form.next.as_deref())).into_response()),
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            let (status, errors) = form_failure(e, "Invalid email or password")?;
            Ok((
                status,
                LoginTemplate {
                    nav: NavView::default(),
                    nonce,
                    email: form.email,
                    next: safe_redirect(form.next.as_deref())
                        .unwrap_or_default()
                        .to_string(),
                    errors,
                    success: None,
                },
            )
                .into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
) -> Response {
    if let Some(auth) = auth {
        return Redirect::to(&landing_page(&auth, None)).into_response();
    }

    RegisterTemplate {
        nav: NavView::default(),
        nonce,
        name: String::new(),
        email: String::new(),
        roles: RoleOption::list(Role::Customer.as_str()),
        errors: FormErrors::default(),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// Registers the user with the backend and logs them straight in.
#[instrument(skip(state, session, nonce, form), fields(email = %form.email, role = %form.role))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let store = AuthStore::new(&session, state.backend());
    let account = NewAccount {
        name: &form.name,
        email: &form.email,
        password: &form.password,
        password_confirm: &form.password_confirm,
        role: &form.role,
    };

    match store.register(account).await {
        Ok(auth) => Ok(Redirect::to(&landing_page(&auth, None)).into_response()),
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            let (status, errors) = form_failure(e, "Registration succeeded but login failed")?;
            Ok((
                status,
                RegisterTemplate {
                    nav: NavView::default(),
                    nonce,
                    roles: RoleOption::list(&form.role),
                    name: form.name,
                    email: form.email,
                    errors,
                },
            )
                .into_response())
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    let store = AuthStore::new(&session, state.backend());
    if let Err(e) = store.logout().await {
        tracing::error!("Failed to clear session on logout: {e}");
        return Redirect::to("/auth/login?error=session").into_response();
    }

    Redirect::to("/auth/login?success=logged_out").into_response()
}
