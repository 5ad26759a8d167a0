//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use venture_market_core::ProductId;

use crate::backend::ProductFilter;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth};
use crate::models::AuthState;
use crate::routes::parse_optional_id;
use crate::routes::views::{CategoryView, NavView, ProductView};
use crate::state::AppState;

/// Product listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub venture: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub products: Vec<ProductView>,
    pub categories: Vec<CategoryView>,
    pub active_category: String,
    pub active_venture: String,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub product: ProductView,
    /// `disabled` when the product cannot be added to the cart.
    pub add_disabled_attr: &'static str,
    /// Why adding is unavailable, shown under the button.
    pub add_unavailable_reason: Option<&'static str>,
    pub login_next: String,
}

/// Why the add-to-cart button is disabled, if it is.
fn add_unavailable_reason(in_stock: bool, auth: Option<&AuthState>) -> Option<&'static str> {
    if !in_stock {
        return Some("This product is out of stock");
    }
    match auth {
        None => Some("Log in as a customer to add items to your cart"),
        Some(auth) if !auth.user.is_customer() => Some("Only customers can buy products"),
        Some(_) => None,
    }
}

/// Display product listing.
#[instrument(skip(state, auth, nonce))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ProductFilter {
        category: parse_optional_id(query.category.as_deref(), "category")?,
        venture: parse_optional_id(query.venture.as_deref(), "venture")?,
    };

    let products = state.backend().list_products(filter).await?;
    let categories = state.backend().list_categories().await?;

    Ok(ProductsIndexTemplate {
        nav: NavView::new(auth.as_ref()),
        nonce,
        products: products.iter().map(ProductView::from).collect(),
        categories: categories.iter().map(CategoryView::from).collect(),
        active_category: filter.category.map(|c| c.to_string()).unwrap_or_default(),
        active_venture: filter.venture.map(|v| v.to_string()).unwrap_or_default(),
    })
}

/// Display product detail page.
#[instrument(skip(state, auth, nonce))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    CspNonce(nonce): CspNonce,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    let product = state.backend().get_product(id).await?;
    let product_id = id.to_string();
    add_breadcrumb(
        "navigation",
        "Viewed product page",
        Some([("product_id", product_id.as_str())].as_slice()),
    );

    let reason = add_unavailable_reason(product.in_stock(), auth.as_ref());

    Ok(ProductShowTemplate {
        nav: NavView::new(auth.as_ref()),
        nonce,
        product: ProductView::from(&product),
        add_disabled_attr: if reason.is_some() { "disabled" } else { "" },
        add_unavailable_reason: reason,
        login_next: format!("/products/{id}"),
    })
}
