//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth};
use crate::routes::views::{CartView, NavView};
use crate::state::AppState;
use crate::stores::CartStore;

/// User display data for templates.
#[derive(Clone)]
pub struct UserView {
    pub name: String,
    pub email: String,
    pub role: &'static str,
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub user: UserView,
    /// Cached cart summary, for customers.
    pub cart: Option<CartView>,
    /// Number of owned ventures, for entrepreneurs.
    pub venture_count: Option<usize>,
}

/// Display account overview page.
///
/// The `RequireAuth` extractor ensures the user is logged in.
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse, AppError> {
    let cart = if auth.user.is_customer() {
        let store = CartStore::new(&session, state.backend(), &auth.token);
        Some(CartView::from(&store.snapshot().await?))
    } else {
        None
    };

    let venture_count = if auth.user.is_entrepreneur() {
        match state
            .backend()
            .list_ventures_by_owner(auth.user.external_id)
            .await
        {
            Ok(ventures) => Some(ventures.len()),
            Err(e) => {
                tracing::warn!("Failed to count ventures: {e}");
                None
            }
        }
    } else {
        None
    };

    Ok(AccountIndexTemplate {
        nav: NavView::new(Some(&auth)),
        nonce,
        user: UserView {
            name: auth.user.name.clone(),
            email: auth.user.email.to_string(),
            role: auth.user.role.label(),
        },
        cart,
        venture_count,
    })
}
