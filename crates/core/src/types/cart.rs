//! Cart records.
//!
//! The backend recomputes the cart on every mutation; the storefront keeps the
//! last response. Subtotals and the total are always derived from the items so
//! that the displayed total equals the sum of the displayed subtotals.

use serde::{Deserialize, Serialize};

use super::{CartId, CartItemId, Price, Product, ProductId};

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub external_id: CartItemId,
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Unit price × quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// A customer's pending order draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub external_id: Option<CartId>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// A cart with no lines and no backend identity.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            external_id: None,
            items: Vec::new(),
        }
    }

    /// Sum of item subtotals.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by its ID.
    #[must_use]
    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.external_id == id)
    }

    /// Find the line holding a product.
    #[must_use]
    pub fn item_for_product(&self, product: ProductId) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|item| item.product.external_id == product)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: u128, product: u128, price: f64, quantity: u32) -> serde_json::Value {
        json!({
            "externalId": uuid::Uuid::from_u128(id),
            "quantity": quantity,
            "product": {
                "externalId": uuid::Uuid::from_u128(product),
                "venture": {"externalId": uuid::Uuid::from_u128(99), "name": "Taller"},
                "name": format!("Product {product}"),
                "price": price,
                "stock": 10
            }
        })
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let cart: Cart = serde_json::from_value(json!({
            "externalId": uuid::Uuid::from_u128(1),
            "items": [item(10, 100, 12.5, 2), item(11, 101, 3.25, 3)],
            "total": 999
        }))
        .unwrap();

        let subtotals: Vec<String> = cart.items.iter().map(|i| i.subtotal().to_string()).collect();
        assert_eq!(subtotals, vec!["$25.00", "$9.75"]);
        assert_eq!(cart.total().to_string(), "$34.75");
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::empty();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
        assert_eq!(cart.item_count(), 0);

        let from_backend: Cart = serde_json::from_value(json!({})).unwrap();
        assert_eq!(from_backend, cart);
    }

    #[test]
    fn test_out_of_range_price_rejected_on_decode() {
        let mut line = item(10, 100, 1.0, 3);
        line["product"]["price"] = json!("50000000000000000000000000000");
        let result = serde_json::from_value::<Cart>(json!({"items": [line]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_lookup_lines() {
        let cart: Cart =
            serde_json::from_value(json!({"items": [item(10, 100, 1.0, 1)]})).unwrap();
        let line = CartItemId::new(uuid::Uuid::from_u128(10));
        let product = ProductId::new(uuid::Uuid::from_u128(100));

        assert_eq!(cart.item(line).unwrap().quantity, 1);
        assert_eq!(cart.item_for_product(product).unwrap().external_id, line);
        assert!(cart.item(CartItemId::new(uuid::Uuid::from_u128(11))).is_none());
    }
}
