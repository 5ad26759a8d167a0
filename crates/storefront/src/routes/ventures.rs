//! Venture route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use venture_market_core::{CategoryId, VentureId};

use crate::backend::ProductFilter;
use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::routes::parse_optional_id;
use crate::routes::views::{CategoryView, NavView, ProductView, VentureView};
use crate::state::AppState;

/// Venture listing query parameters.
#[derive(Debug, Deserialize)]
pub struct VentureQuery {
    pub category: Option<String>,
}

/// Venture listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "ventures/index.html")]
pub struct VenturesIndexTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub ventures: Vec<VentureView>,
    pub categories: Vec<CategoryView>,
    pub active_category: Option<CategoryView>,
}

/// Venture detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "ventures/show.html")]
pub struct VentureShowTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub venture: VentureView,
    pub products: Vec<ProductView>,
}

/// Display venture listing, optionally narrowed to one category.
#[instrument(skip(state, auth, nonce))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<VentureQuery>,
) -> Result<impl IntoResponse, AppError> {
    let category: Option<CategoryId> = parse_optional_id(query.category.as_deref(), "category")?;

    let categories = state.backend().list_categories().await?;
    let ventures = state.backend().list_ventures().await?;

    let active_category = category
        .and_then(|id| categories.iter().find(|c| c.external_id == id))
        .map(CategoryView::from);

    let ventures = ventures
        .iter()
        .filter(|v| category.is_none_or(|id| v.category_ids().contains(&id)))
        .map(VentureView::from)
        .collect();

    Ok(VenturesIndexTemplate {
        nav: NavView::new(auth.as_ref()),
        nonce,
        ventures,
        categories: categories.iter().map(CategoryView::from).collect(),
        active_category,
    })
}

/// Display one venture with its products.
#[instrument(skip(state, auth, nonce))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Path(id): Path<VentureId>,
) -> Result<impl IntoResponse, AppError> {
    let venture = state.backend().get_venture(id).await?;
    let products = state
        .backend()
        .list_products(ProductFilter::venture(id))
        .await?;

    Ok(VentureShowTemplate {
        nav: NavView::new(auth.as_ref()),
        nonce,
        venture: VentureView::from(&venture),
        products: products.iter().map(ProductView::from).collect(),
    })
}
