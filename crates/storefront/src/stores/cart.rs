//! Cart store.
//!
//! The session keeps the last cart the backend returned. Every mutation is a
//! backend call whose response replaces the snapshot; nothing is applied
//! locally first.

use secrecy::SecretString;
use tower_sessions::Session;
use tracing::{debug, instrument};

use venture_market_core::validation::validate_quantity;
use venture_market_core::{Cart, CartItemId, ProductId};

use super::StoreError;
use crate::backend::BackendClient;
use crate::models::session_keys;

/// Session-backed cart for one authenticated customer.
pub struct CartStore<'a> {
    session: &'a Session,
    backend: &'a BackendClient,
    token: &'a SecretString,
}

impl<'a> CartStore<'a> {
    #[must_use]
    pub const fn new(
        session: &'a Session,
        backend: &'a BackendClient,
        token: &'a SecretString,
    ) -> Self {
        Self {
            session,
            backend,
            token,
        }
    }

    /// The cached cart without a backend call; empty when nothing is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn snapshot(&self) -> Result<Cart, StoreError> {
        Ok(self
            .session
            .get::<Cart>(session_keys::CART)
            .await?
            .unwrap_or_default())
    }

    /// Fetch the cart from the backend and cache it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call or the session write fails.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Cart, StoreError> {
        let cart = self.backend.get_cart(self.token).await?;
        self.save(cart).await
    }

    /// Add units of a product.
    ///
    /// The product is fetched first so that the combined quantity (already in
    /// the cart plus `quantity`) never exceeds its stock.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` when the quantity is zero or above
    /// stock, or a backend/session error.
    #[instrument(skip(self), fields(product = %product_id))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<Cart, StoreError> {
        let product = self.backend.get_product(product_id).await?;
        let in_cart = self
            .snapshot()
            .await?
            .item_for_product(product_id)
            .map_or(0, |item| item.quantity);

        validate_quantity(quantity, product.stock.saturating_sub(in_cart))?;

        let cart = self
            .backend
            .add_cart_item(self.token, product_id, quantity)
            .await?;
        debug!(items = cart.item_count(), "Added to cart");
        self.save(cart).await
    }

    /// Set a line's quantity; zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ItemNotFound` when the line is not in the cart,
    /// `StoreError::Validation` when the quantity exceeds stock, or a
    /// backend/session error.
    #[instrument(skip(self), fields(item = %item_id))]
    pub async fn update(&self, item_id: CartItemId, quantity: u32) -> Result<Cart, StoreError> {
        if quantity == 0 {
            return self.remove(item_id).await;
        }

        let mut cart = self.snapshot().await?;
        if cart.item(item_id).is_none() {
            cart = self.refresh().await?;
        }
        let stock = cart
            .item(item_id)
            .ok_or(StoreError::ItemNotFound)?
            .product
            .stock;

        validate_quantity(quantity, stock)?;

        let cart = self
            .backend
            .update_cart_item(self.token, item_id, quantity)
            .await?;
        self.save(cart).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call or the session write fails.
    #[instrument(skip(self), fields(item = %item_id))]
    pub async fn remove(&self, item_id: CartItemId) -> Result<Cart, StoreError> {
        let cart = self.backend.remove_cart_item(self.token, item_id).await?;
        self.save(cart).await
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call or the session write fails.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<Cart, StoreError> {
        let cart = self.backend.clear_cart(self.token).await?;
        self.save(cart).await
    }

    async fn save(&self, cart: Cart) -> Result<Cart, StoreError> {
        self.session.insert(session_keys::CART, &cart).await?;
        Ok(cart)
    }
}
