//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::routes::views::{CategoryView, NavView, VentureView};
use crate::state::AppState;

/// Number of ventures featured on the home page.
const FEATURED_VENTURES: usize = 6;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub categories: Vec<CategoryView>,
    pub ventures: Vec<VentureView>,
}

/// Display the home page.
///
/// Catalogue failures degrade to empty sections rather than an error page.
#[instrument(skip(state, auth, nonce))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
) -> impl IntoResponse {
    let categories = state.backend().list_categories().await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch categories: {e}");
            Vec::new()
        },
        |categories| categories.iter().map(CategoryView::from).collect(),
    );

    let ventures = state.backend().list_ventures().await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch ventures: {e}");
            Vec::new()
        },
        |ventures| {
            ventures
                .iter()
                .take(FEATURED_VENTURES)
                .map(VentureView::from)
                .collect()
        },
    );

    HomeTemplate {
        nav: NavView::new(auth.as_ref()),
        nonce,
        categories,
        ventures,
    }
}
