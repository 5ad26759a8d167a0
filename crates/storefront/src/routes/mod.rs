//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (categories + featured ventures)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (backend reachable)
//!
//! # Catalogue
//! GET  /ventures               - Venture listing (?category=)
//! GET  /ventures/{id}          - Venture detail with products
//! GET  /products               - Product listing (?category= &venture=)
//! GET  /products/{id}          - Product detail
//! GET  /categories/{id}        - Category with products
//!
//! # Cart (customers; HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/clear             - Empty cart (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Account (requires auth)
//! GET  /account                - Account overview
//!
//! # Seller dashboard (entrepreneurs)
//! GET  /dashboard                               - Own ventures
//! GET  /dashboard/ventures/new                  - New venture form
//! POST /dashboard/ventures                      - Create venture
//! GET  /dashboard/ventures/{id}                 - Own venture with products
//! GET  /dashboard/ventures/{id}/edit            - Edit venture form
//! POST /dashboard/ventures/{id}                 - Update venture
//! POST /dashboard/ventures/{id}/delete          - Delete venture
//! GET  /dashboard/ventures/{id}/products/new    - New product form
//! POST /dashboard/ventures/{id}/products        - Create product
//! GET  /dashboard/products/{id}/edit            - Edit product form
//! POST /dashboard/products/{id}                 - Update product
//! POST /dashboard/products/{id}/delete          - Delete product
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod home;
pub mod products;
pub mod ventures;
pub mod views;

use std::str::FromStr;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::{
    api_rate_limiter, auth_rate_limiter, csp_nonce_middleware, initialize_auth,
    request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Directory static assets are served from.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Parse an optional ID query parameter; blank counts as absent.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the value is not a valid ID.
pub fn parse_optional_id<T: FromStr>(
    raw: Option<&str>,
    name: &str,
) -> Result<Option<T>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("invalid {name} id"))),
        None => Ok(None),
    }
}

/// Create the auth routes router.
pub fn auth_routes(rate_limit: bool) -> Router<AppState> {
    let limited = Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register));
    let limited = if rate_limit {
        limited.route_layer(auth_rate_limiter())
    } else {
        limited
    };

    limited.route("/logout", post(auth::logout))
}

/// Create the catalogue routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/ventures", get(ventures::index))
        .route("/ventures/{id}", get(ventures::show))
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/categories/{id}", get(categories::show))
}

/// Create the cart routes router.
pub fn cart_routes(rate_limit: bool) -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear));
    let mutations = if rate_limit {
        mutations.route_layer(api_rate_limiter())
    } else {
        mutations
    };

    mutations
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
}

/// Create the seller dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/ventures", post(dashboard::create_venture))
        .route("/ventures/new", get(dashboard::new_venture))
        .route(
            "/ventures/{id}",
            get(dashboard::show_venture).post(dashboard::update_venture),
        )
        .route("/ventures/{id}/edit", get(dashboard::edit_venture))
        .route("/ventures/{id}/delete", post(dashboard::delete_venture))
        .route("/ventures/{id}/products", post(dashboard::create_product))
        .route("/ventures/{id}/products/new", get(dashboard::new_product))
        .route("/products/{id}", post(dashboard::update_product))
        .route("/products/{id}/edit", get(dashboard::edit_product))
        .route("/products/{id}/delete", post(dashboard::delete_product))
}

/// Create all page routes for the storefront.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(catalog_routes())
        .route("/account", get(account::index))
        .nest("/auth", auth_routes(rate_limit))
        .nest("/cart", cart_routes(rate_limit))
        .nest("/dashboard", dashboard_routes())
}

/// Build the application router with its per-request middleware.
///
/// Expects a session layer (and optionally the Sentry layers) to be added
/// on top by the caller.
pub fn app(state: AppState) -> Router {
    let rate_limit = state.config().rate_limit;

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes(rate_limit))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            initialize_auth,
        ))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(csp_nonce_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;
    use venture_market_core::CategoryId;

    use crate::config::StorefrontConfig;
    use crate::middleware::create_session_layer;

    fn test_app() -> Router {
        let config = StorefrontConfig::from_lookup(|key| match key {
            "BACKEND_API_URL" => Some("http://127.0.0.1:9/".to_string()),
            "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
            "STOREFRONT_RATE_LIMIT" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        let session_layer = create_session_layer(MemoryStore::default(), &config);
        app(AppState::new(config).unwrap()).layer(session_layer)
    }

    #[tokio::test]
    async fn test_health_through_middleware_stack() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("content-security-policy"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = test_app()
            .oneshot(Request::get("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_parse_optional_id() {
        let none: Option<CategoryId> = parse_optional_id(None, "category").unwrap();
        assert!(none.is_none());

        let blank: Option<CategoryId> = parse_optional_id(Some("  "), "category").unwrap();
        assert!(blank.is_none());

        let id: Option<CategoryId> =
            parse_optional_id(Some("33333333-3333-4333-8333-333333333333"), "category").unwrap();
        assert!(id.is_some());

        let err = parse_optional_id::<CategoryId>(Some("coffee"), "category").unwrap_err();
        assert_eq!(err.to_string(), "Bad request: invalid category id");
    }
}
