//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use venture_market_core::CategoryId;

use crate::backend::ProductFilter;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::routes::views::{CategoryView, NavView, ProductView};
use crate::state::AppState;

/// Category page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub category: CategoryView,
    pub products: Vec<ProductView>,
}

/// Display one category with its products.
#[instrument(skip(state, auth, nonce))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Path(id): Path<CategoryId>,
) -> Result<impl IntoResponse, AppError> {
    let category = state.backend().get_category(id).await?;
    let products = state
        .backend()
        .list_products(ProductFilter::category(id))
        .await?;

    Ok(CategoryShowTemplate {
        nav: NavView::new(auth.as_ref()),
        nonce,
        category: CategoryView::from(&category),
        products: products.iter().map(ProductView::from).collect(),
    })
}
