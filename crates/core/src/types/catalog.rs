//! Catalogue records: categories, ventures, and products.

use serde::{Deserialize, Serialize};

use super::{CategoryId, Price, ProductId, UserId, VentureId};

/// A product/venture category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub external_id: CategoryId,
    pub name: String,
}

/// A seller's storefront, owned by one entrepreneur.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venture {
    pub external_id: VentureId,
    pub owner: UserId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Venture {
    /// Whether `user` owns this venture.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }

    /// IDs of the venture's categories, in backend order.
    #[must_use]
    pub fn category_ids(&self) -> Vec<CategoryId> {
        self.categories.iter().map(|c| c.external_id).collect()
    }
}

/// The venture a product belongs to, as embedded in product payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VentureRef {
    pub external_id: VentureId,
    pub name: String,
}

/// An item for sale under a venture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub external_id: ProductId,
    pub venture: VentureRef,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub stock: u32,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Whether `quantity` units (at least one) can be ordered.
    #[must_use]
    pub const fn can_fulfil(&self, quantity: u32) -> bool {
        quantity > 0 && quantity <= self.stock
    }

    /// IDs of the product's categories, in backend order.
    #[must_use]
    pub fn category_ids(&self) -> Vec<CategoryId> {
        self.categories.iter().map(|c| c.external_id).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product_json(stock: u32) -> serde_json::Value {
        json!({
            "externalId": "11111111-1111-4111-8111-111111111111",
            "venture": {
                "externalId": "22222222-2222-4222-8222-222222222222",
                "name": "Café Origen"
            },
            "name": "Colombian beans 500g",
            "price": 12.5,
            "stock": stock,
            "categories": [
                {"externalId": "33333333-3333-4333-8333-333333333333", "name": "Coffee"}
            ]
        })
    }

    #[test]
    fn test_product_from_backend_json() {
        let product: Product = serde_json::from_value(product_json(4)).unwrap();
        assert_eq!(product.venture.name, "Café Origen");
        assert_eq!(product.price.to_string(), "$12.50");
        assert_eq!(product.description, None);
        assert_eq!(product.category_ids().len(), 1);
    }

    #[test]
    fn test_stock_checks() {
        let product: Product = serde_json::from_value(product_json(2)).unwrap();
        assert!(product.in_stock());
        assert!(product.can_fulfil(2));
        assert!(!product.can_fulfil(3));
        assert!(!product.can_fulfil(0));

        let sold_out: Product = serde_json::from_value(product_json(0)).unwrap();
        assert!(!sold_out.in_stock());
        assert!(!sold_out.can_fulfil(1));
    }

    #[test]
    fn test_venture_ownership() {
        let owner = UserId::new(uuid::Uuid::from_u128(7));
        let venture: Venture = serde_json::from_value(json!({
            "externalId": "22222222-2222-4222-8222-222222222222",
            "owner": owner,
            "name": "Café Origen"
        }))
        .unwrap();
        assert!(venture.is_owned_by(owner));
        assert!(!venture.is_owned_by(UserId::new(uuid::Uuid::from_u128(8))));
        assert!(venture.categories.is_empty());
    }
}
