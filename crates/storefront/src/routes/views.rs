//! Display types shared by the page templates.
//!
//! Handlers convert backend records into these flat, pre-formatted views so
//! templates only print strings.

use std::collections::HashMap;

use venture_market_core::{Cart, CartItem, Category, CategoryId, Product, ValidationErrors, Venture};

use crate::models::AuthState;

// =============================================================================
// Navigation
// =============================================================================

/// Navigation bar state.
#[derive(Clone, Default)]
pub struct NavView {
    pub user_name: Option<String>,
    pub is_entrepreneur: bool,
    pub is_customer: bool,
}

impl NavView {
    #[must_use]
    pub fn new(auth: Option<&AuthState>) -> Self {
        auth.map_or_else(Self::default, |auth| Self {
            user_name: Some(auth.user.name.clone()),
            is_entrepreneur: auth.user.is_entrepreneur(),
            is_customer: auth.user.is_customer(),
        })
    }
}

// =============================================================================
// Catalogue
// =============================================================================

/// Category display data for templates.
#[derive(Clone)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.external_id.to_string(),
            name: category.name.clone(),
        }
    }
}

/// Venture display data for templates.
#[derive(Clone)]
pub struct VentureView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category_names: String,
    pub categories: Vec<CategoryView>,
}

impl From<&Venture> for VentureView {
    fn from(venture: &Venture) -> Self {
        Self {
            id: venture.external_id.to_string(),
            name: venture.name.clone(),
            description: venture.description.clone().unwrap_or_default(),
            category_names: join_names(&venture.categories),
            categories: venture.categories.iter().map(CategoryView::from).collect(),
        }
    }
}

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub venture_id: String,
    pub venture_name: String,
    pub price: String,
    pub stock: u32,
    pub stock_label: String,
    pub category_names: String,
    pub categories: Vec<CategoryView>,
    pub image_url: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let stock_label = match product.stock {
            0 => "Out of stock".to_string(),
            1 => "Last one".to_string(),
            n => format!("{n} in stock"),
        };

        Self {
            id: product.external_id.to_string(),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            venture_id: product.venture.external_id.to_string(),
            venture_name: product.venture.name.clone(),
            price: product.price.to_string(),
            stock: product.stock,
            stock_label,
            category_names: join_names(&product.categories),
            categories: product.categories.iter().map(CategoryView::from).collect(),
            image_url: product.image_url.clone(),
        }
    }
}

fn join_names(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Cart
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub venture_name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub max_quantity: u32,
    pub subtotal: String,
    pub image_url: Option<String>,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.external_id.to_string(),
            product_id: item.product.external_id.to_string(),
            name: item.product.name.clone(),
            venture_name: item.product.venture.name.clone(),
            unit_price: item.product.price.to_string(),
            quantity: item.quantity,
            max_quantity: item.product.stock.max(item.quantity),
            subtotal: item.subtotal().to_string(),
            image_url: item.product.image_url.clone(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.iter().map(CartItemView::from).collect(),
            total: cart.total().to_string(),
            item_count: cart.item_count(),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Field messages for a re-rendered form.
#[derive(Clone, Default)]
pub struct FormErrors {
    fields: HashMap<&'static str, String>,
    /// Message not tied to one field (backend rejection, conflict).
    pub form: Option<String>,
}

impl FormErrors {
    /// Errors carrying only a form-level message.
    #[must_use]
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            fields: HashMap::new(),
            form: Some(message.into()),
        }
    }

    /// Message for `name`, or an empty string.
    #[must_use]
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }

    /// Whether nothing is reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form.is_none()
    }
}

impl From<&ValidationErrors> for FormErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut fields = HashMap::new();
        for error in errors.errors() {
            fields
                .entry(error.field)
                .or_insert_with(|| error.message.clone());
        }
        Self { fields, form: None }
    }
}

/// A category checkbox in a venture or product form.
#[derive(Clone)]
pub struct CategoryOption {
    pub id: String,
    pub name: String,
    pub checked_attr: &'static str,
}

impl CategoryOption {
    /// Options for every category, checking those listed in `selected`.
    #[must_use]
    pub fn list(categories: &[Category], selected: &[String]) -> Vec<Self> {
        categories
            .iter()
            .map(|category| {
                let id = category.external_id.to_string();
                let checked_attr = if selected.contains(&id) { "checked" } else { "" };
                Self {
                    id,
                    name: category.name.clone(),
                    checked_attr,
                }
            })
            .collect()
    }
}

/// Stringify category IDs for form pre-selection.
#[must_use]
pub fn selected_ids(ids: &[CategoryId]) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

/// Read every value of `key` from raw form pairs.
#[must_use]
pub fn form_values(pairs: &[(String, String)], key: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .collect()
}

/// Read the first value of `key` from raw form pairs.
#[must_use]
pub fn form_value(pairs: &[(String, String)], key: &str) -> String {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

// =============================================================================
// Flash messages
// =============================================================================

/// Human-readable text for `?error=` / `?success=` codes.
#[must_use]
pub fn flash_message(code: &str) -> Option<&'static str> {
    let message = match code {
        "session" => "Your session could not be saved. Please try again.",
        "backend" => "The marketplace is unavailable right now. Please try again.",
        "delete_rejected" => "The marketplace refused to delete that. Remove what depends on it first.",
        "venture_created" => "Venture created.",
        "venture_updated" => "Venture updated.",
        "venture_deleted" => "Venture deleted.",
        "product_created" => "Product created.",
        "product_updated" => "Product updated.",
        "product_deleted" => "Product deleted.",
        "logged_out" => "You have been logged out.",
        _ => return None,
    };
    Some(message)
}

/// Only accept same-site relative redirect targets.
#[must_use]
pub fn safe_redirect(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_view_stock_label() {
        let mut product: Product = serde_json::from_value(json!({
            "externalId": "11111111-1111-4111-8111-111111111111",
            "venture": {"externalId": "22222222-2222-4222-8222-222222222222", "name": "Taller"},
            "name": "Mug",
            "price": 8,
            "stock": 0,
            "categories": [
                {"externalId": "33333333-3333-4333-8333-333333333333", "name": "Home"},
                {"externalId": "44444444-4444-4444-8444-444444444444", "name": "Gifts"}
            ]
        }))
        .unwrap();

        let view = ProductView::from(&product);
        assert_eq!(view.stock_label, "Out of stock");
        assert_eq!(view.price, "$8.00");
        assert_eq!(view.category_names, "Home, Gifts");

        product.stock = 1;
        assert_eq!(ProductView::from(&product).stock_label, "Last one");
        product.stock = 7;
        assert_eq!(ProductView::from(&product).stock_label, "7 in stock");
    }

    #[test]
    fn test_form_errors_keep_first_message_per_field() {
        let mut errors = ValidationErrors::new();
        errors.push("price", "Price is required");
        errors.push("price", "Price must be a number");
        let view = FormErrors::from(&errors);
        assert_eq!(view.field("price"), "Price is required");
        assert_eq!(view.field("name"), "");
        assert!(!view.is_empty());
    }

    #[test]
    fn test_category_options_checked() {
        let categories: Vec<Category> = serde_json::from_value(json!([
            {"externalId": "33333333-3333-4333-8333-333333333333", "name": "Home"},
            {"externalId": "44444444-4444-4444-8444-444444444444", "name": "Gifts"}
        ]))
        .unwrap();
        let options = CategoryOption::list(
            &categories,
            &["44444444-4444-4444-8444-444444444444".to_string()],
        );
        assert_eq!(options[0].checked_attr, "");
        assert_eq!(options[1].checked_attr, "checked");
    }

    #[test]
    fn test_form_values() {
        let pairs = vec![
            ("name".to_string(), "Taller".to_string()),
            ("categories".to_string(), "a".to_string()),
            ("categories".to_string(), "b".to_string()),
        ];
        assert_eq!(form_values(&pairs, "categories"), vec!["a", "b"]);
        assert_eq!(form_value(&pairs, "name"), "Taller");
        assert_eq!(form_value(&pairs, "missing"), "");
    }

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(Some("/cart")), Some("/cart"));
        assert_eq!(safe_redirect(Some("//evil.example")), None);
        assert_eq!(safe_redirect(Some("https://evil.example")), None);
        assert_eq!(safe_redirect(Some("/\\evil")), None);
        assert_eq!(safe_redirect(None), None);
    }
}
