//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Only customers have a cart; the snapshot in the session is whatever the
//! backend returned last.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use venture_market_core::validation::parse_quantity;
use venture_market_core::{CartItemId, ProductId, ValidationErrors};

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, RequireCustomer};
use crate::routes::views::{CartView, NavView};
use crate::state::AppState;
use crate::stores::{CartStore, StoreError};

/// Event HTMX listeners use to refresh cart widgets.
const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: CartItemId,
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: CartItemId,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub cart: CartView,
    pub error: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub error: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline status message fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_message.html")]
pub struct CartMessageTemplate {
    pub message: String,
    pub is_error: bool,
}

/// Swap a validation message into the add-to-cart status slot.
fn add_rejected(message: String) -> Response {
    (
        AppendHeaders([
            ("HX-Retarget", "#add-to-cart-status"),
            ("HX-Reswap", "innerHTML"),
        ]),
        CartMessageTemplate {
            message,
            is_error: true,
        },
    )
        .into_response()
}

/// First message of a validation failure.
fn first_message(errors: &ValidationErrors) -> String {
    errors
        .errors()
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_default()
}

/// Turn a cart failure into a message shown inline.
///
/// HTMX does not swap error responses, so everything the customer can act
/// on is answered with a 200 fragment. Session failures and revoked tokens
/// still go through `AppError`.
fn inline_message(err: StoreError) -> Result<String, StoreError> {
    match err {
        StoreError::Validation(errors) => Ok(first_message(&errors)),
        StoreError::ItemNotFound => Ok("That item is no longer in your cart".to_string()),
        StoreError::Backend(e) if e.is_unauthorized() => Err(StoreError::Backend(e)),
        StoreError::Backend(e) => Ok(e.user_message().map_or_else(
            || {
                tracing::warn!("Cart operation failed: {e}");
                "We couldn't update your cart. Please try again.".to_string()
            },
            str::to_string,
        )),
        other @ StoreError::Session(_) => Err(other),
    }
}

/// Re-render the items fragment from the snapshot with a message.
async fn items_with_error(store: &CartStore<'_>, err: StoreError) -> Result<Response, AppError> {
    let message = inline_message(err)?;
    let cart = store.snapshot().await?;
    Ok(CartItemsTemplate {
        cart: CartView::from(&cart),
        error: Some(message),
    }
    .into_response())
}

/// Display cart page.
///
/// Always refreshes from the backend; falls back to the snapshot if that
/// fails.
#[instrument(skip(state, session, auth, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(auth): RequireCustomer,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse, AppError> {
    let store = CartStore::new(&session, state.backend(), &auth.token);

    let (cart, error) = match store.refresh().await {
        Ok(cart) => (cart, None),
        Err(StoreError::Backend(e)) => {
            tracing::warn!("Failed to refresh cart: {e}");
            (
                store.snapshot().await?,
                Some("Showing your last saved cart; it may be out of date.".to_string()),
            )
        }
        Err(e) => return Err(e.into()),
    };

    Ok(CartShowTemplate {
        nav: NavView::new(Some(&auth)),
        nonce,
        cart: CartView::from(&cart),
        error,
    })
}

/// Add item to cart (HTMX).
///
/// Returns the count badge with an HTMX trigger so other cart widgets
/// refresh. Quantities above stock are answered with an inline message.
#[instrument(skip(state, session, auth))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(auth): RequireCustomer,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let store = CartStore::new(&session, state.backend(), &auth.token);
    let quantity = match form.quantity.as_deref().map(parse_quantity) {
        None => 1,
        Some(Ok(quantity)) => quantity,
        Some(Err(errors)) => return Ok(add_rejected(first_message(&errors))),
    };

    match store.add(form.product_id, quantity).await {
        Ok(cart) => {
            let product_id = form.product_id.to_string();
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some([("product_id", product_id.as_str())].as_slice()),
            );
            Ok((
                AppendHeaders([CART_UPDATED]),
                CartCountTemplate {
                    count: cart.item_count(),
                },
            )
                .into_response())
        }
        Err(e) => Ok(add_rejected(inline_message(e)?)),
    }
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state, session, auth))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(auth): RequireCustomer,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response, AppError> {
    let store = CartStore::new(&session, state.backend(), &auth.token);
    let quantity = match parse_quantity(&form.quantity) {
        Ok(quantity) => quantity,
        Err(errors) => return items_with_error(&store, errors.into()).await,
    };

    match store.update(form.item_id, quantity).await {
        Ok(cart) => Ok((
            AppendHeaders([CART_UPDATED]),
            CartItemsTemplate {
                cart: CartView::from(&cart),
                error: None,
            },
        )
            .into_response()),
        Err(e) => items_with_error(&store, e).await,
    }
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, auth))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(auth): RequireCustomer,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response, AppError> {
    let store = CartStore::new(&session, state.backend(), &auth.token);

    match store.remove(form.item_id).await {
        Ok(cart) => Ok((
            AppendHeaders([CART_UPDATED]),
            CartItemsTemplate {
                cart: CartView::from(&cart),
                error: None,
            },
        )
            .into_response()),
        Err(e) => items_with_error(&store, e).await,
    }
}

/// Empty the cart (HTMX).
#[instrument(skip(state, session, auth))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    RequireCustomer(auth): RequireCustomer,
) -> Result<Response, AppError> {
    let store = CartStore::new(&session, state.backend(), &auth.token);

    match store.clear().await {
        Ok(cart) => Ok((
            AppendHeaders([CART_UPDATED]),
            CartItemsTemplate {
                cart: CartView::from(&cart),
                error: None,
            },
        )
            .into_response()),
        Err(e) => items_with_error(&store, e).await,
    }
}

/// Get cart count badge (HTMX).
///
/// Read from the snapshot; no backend call. Zero for anyone without a cart.
#[instrument(skip(state, session, auth))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(auth): OptionalAuth,
) -> impl IntoResponse {
    let count = match auth.filter(|a| a.user.is_customer()) {
        Some(auth) => CartStore::new(&session, state.backend(), &auth.token)
            .snapshot()
            .await
            .map(|cart| cart.item_count())
            .unwrap_or(0),
        None => 0,
    };

    CartCountTemplate { count }
}
