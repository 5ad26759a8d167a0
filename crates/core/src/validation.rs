//! Form validation rules.
//!
//! Every form the storefront accepts is checked here before anything is sent
//! to the backend. Each validator collects all field problems at once so the
//! form can be re-rendered with every message, and returns a typed draft on
//! success.

use std::collections::HashSet;

use thiserror::Error;

use crate::types::{CategoryId, Email, Price, PriceError, Role};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;
/// Maximum length of a person's display name.
pub const MAX_NAME_LENGTH: usize = 100;
/// Maximum length of a venture or product name.
pub const MAX_TITLE_LENGTH: usize = 120;
/// Maximum length of a venture or product description.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// A single field problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name, matching the HTML `name` attribute.
    pub field: &'static str,
    /// Message shown next to the field.
    pub message: String,
}

/// All problems found in one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid form: {}", summary(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Create an empty error set.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Create an error set holding one problem.
    #[must_use]
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    /// Record a problem with `field`.
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Whether no problems were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First message recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// All recorded problems, in the order they were found.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// `Ok(value)` if nothing was recorded, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one problem was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

// =============================================================================
// Validated drafts
// =============================================================================

/// A registration that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub password: String,
    pub role: Role,
}

/// Login credentials that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

/// Venture create/update payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VentureDraft {
    pub name: String,
    pub description: Option<String>,
    pub categories: Vec<CategoryId>,
}

/// Product create/update payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: u32,
    pub categories: Vec<CategoryId>,
}

// =============================================================================
// Validators
// =============================================================================

/// Validate the registration form.
///
/// # Errors
///
/// Returns every problem found with `name`, `email`, `password`,
/// `password_confirm`, and `role`.
pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
    password_confirm: &str,
    role: &str,
) -> Result<Registration, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = check_title(&mut errors, "name", name, MAX_NAME_LENGTH);
    let email = check_email(&mut errors, email);

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
        );
    } else if password.chars().count() > MAX_PASSWORD_LENGTH {
        errors.push(
            "password",
            format!("Password must be at most {MAX_PASSWORD_LENGTH} characters"),
        );
    }
    if password != password_confirm {
        errors.push("password_confirm", "Passwords do not match");
    }

    let role = role.parse::<Role>().ok();
    if role.is_none() {
        errors.push("role", "Choose whether you are an entrepreneur or a customer");
    }

    match (email, role) {
        (Some(email), Some(role)) if errors.is_empty() => Ok(Registration {
            name,
            email,
            password: password.to_string(),
            role,
        }),
        _ => Err(errors),
    }
}

/// Validate the login form.
///
/// # Errors
///
/// Returns problems with `email` and `password`.
pub fn validate_login(email: &str, password: &str) -> Result<Credentials, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let email = check_email(&mut errors, email);
    if password.is_empty() {
        errors.push("password", "Password is required");
    }

    match email {
        Some(email) if errors.is_empty() => Ok(Credentials {
            email,
            password: password.to_string(),
        }),
        _ => Err(errors),
    }
}

/// Validate the venture form.
///
/// # Errors
///
/// Returns problems with `name`, `description`, and `categories`. A venture
/// needs at least one category and may not select the same one twice.
pub fn validate_venture(
    name: &str,
    description: &str,
    category_ids: &[String],
) -> Result<VentureDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = check_title(&mut errors, "name", name, MAX_TITLE_LENGTH);
    let description = check_description(&mut errors, description);
    let categories = check_categories(&mut errors, category_ids);
    if category_ids.is_empty() {
        errors.push("categories", "Select at least one category");
    }

    errors.into_result(VentureDraft {
        name,
        description,
        categories,
    })
}

/// Validate the product form.
///
/// # Errors
///
/// Returns problems with `name`, `description`, `price`, `stock`, and
/// `categories`. Price must be greater than zero; stock must be a whole
/// number of at least zero.
pub fn validate_product(
    name: &str,
    description: &str,
    price: &str,
    stock: &str,
    category_ids: &[String],
) -> Result<ProductDraft, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = check_title(&mut errors, "name", name, MAX_TITLE_LENGTH);
    let description = check_description(&mut errors, description);

    let price = match Price::parse(price) {
        Ok(price) if price.is_positive() => Some(price),
        Ok(_) => {
            errors.push("price", "Price must be greater than zero");
            None
        }
        Err(PriceError::Empty) => {
            errors.push("price", "Price is required");
            None
        }
        Err(PriceError::Invalid) => {
            errors.push("price", "Price must be a number");
            None
        }
        Err(PriceError::TooLarge) => {
            errors.push("price", format!("Price must be at most {}", Price::MAX));
            None
        }
    };

    let stock = check_stock(&mut errors, stock);
    let categories = check_categories(&mut errors, category_ids);

    match (price, stock) {
        (Some(price), Some(stock)) if errors.is_empty() => Ok(ProductDraft {
            name,
            description,
            price,
            stock,
            categories,
        }),
        _ => Err(errors),
    }
}

/// Parse a quantity typed into a cart form.
///
/// Zero is accepted here; whether it means removal or is an error depends on
/// the operation.
///
/// # Errors
///
/// Returns a `quantity` problem for blank, negative, or non-numeric input.
pub fn parse_quantity(input: &str) -> Result<u32, ValidationErrors> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationErrors::single("quantity", "Enter a quantity"));
    }
    match input.parse::<i64>() {
        Ok(n) if n < 0 => Err(ValidationErrors::single(
            "quantity",
            "Quantity cannot be negative",
        )),
        Ok(n) => u32::try_from(n)
            .map_err(|_| ValidationErrors::single("quantity", "Quantity is too large")),
        Err(_) => Err(ValidationErrors::single(
            "quantity",
            "Quantity must be a whole number",
        )),
    }
}

/// Validate a cart quantity against available stock.
///
/// # Errors
///
/// Returns a `quantity` problem when the quantity is zero or above `stock`.
pub fn validate_quantity(quantity: u32, stock: u32) -> Result<u32, ValidationErrors> {
    if quantity == 0 {
        return Err(ValidationErrors::single(
            "quantity",
            "Quantity must be at least 1",
        ));
    }
    if quantity > stock {
        let message = if stock == 0 {
            "This product is out of stock".to_string()
        } else {
            format!("Only {stock} left in stock")
        };
        return Err(ValidationErrors::single("quantity", message));
    }
    Ok(quantity)
}

// =============================================================================
// Field helpers
// =============================================================================

fn check_title(errors: &mut ValidationErrors, field: &'static str, value: &str, max: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.push(field, "This field is required");
    } else if value.chars().count() > max {
        errors.push(field, format!("Must be at most {max} characters"));
    }
    value.to_string()
}

fn check_email(errors: &mut ValidationErrors, value: &str) -> Option<Email> {
    match Email::parse(value) {
        Ok(email) => Some(email),
        Err(e) => {
            errors.push("email", capitalize(&e.to_string()));
            None
        }
    }
}

fn check_description(errors: &mut ValidationErrors, value: &str) -> Option<String> {
    let value = value.trim();
    if value.chars().count() > MAX_DESCRIPTION_LENGTH {
        errors.push(
            "description",
            format!("Must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        );
    }
    (!value.is_empty()).then(|| value.to_string())
}

fn check_stock(errors: &mut ValidationErrors, value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() {
        errors.push("stock", "Stock is required");
        return None;
    }
    match value.parse::<i64>() {
        Ok(n) if n < 0 => {
            errors.push("stock", "Stock cannot be negative");
            None
        }
        Ok(n) => u32::try_from(n).map_or_else(
            |_| {
                errors.push("stock", "Stock is too large");
                None
            },
            Some,
        ),
        Err(_) => {
            errors.push("stock", "Stock must be a whole number");
            None
        }
    }
}

fn check_categories(errors: &mut ValidationErrors, raw: &[String]) -> Vec<CategoryId> {
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(raw.len());
    let mut duplicate = false;
    let mut unknown = false;

    for value in raw {
        match value.parse::<CategoryId>() {
            Ok(id) => {
                if seen.insert(id) {
                    ids.push(id);
                } else {
                    duplicate = true;
                }
            }
            Err(_) => unknown = true,
        }
    }

    if unknown {
        errors.push("categories", "Unknown category");
    }
    if duplicate {
        errors.push("categories", "Each category can only be selected once");
    }
    ids
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const COFFEE: &str = "33333333-3333-4333-8333-333333333333";
    const CRAFTS: &str = "44444444-4444-4444-8444-444444444444";

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_registration_valid() {
        let reg = validate_registration(
            "  María López ",
            "maria@tienda.co",
            "s3cure-pass",
            "s3cure-pass",
            "ENTREPRENEUR",
        )
        .unwrap();
        assert_eq!(reg.name, "María López");
        assert_eq!(reg.role, Role::Entrepreneur);
        assert_eq!(reg.email.as_str(), "maria@tienda.co");
    }

    #[test]
    fn test_registration_collects_every_problem() {
        let errors = validate_registration("", "nope", "short", "other", "admin").unwrap_err();
        assert_eq!(errors.get("name"), Some("This field is required"));
        assert_eq!(errors.get("email"), Some("Email must contain an @ symbol"));
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 8 characters")
        );
        assert_eq!(errors.get("password_confirm"), Some("Passwords do not match"));
        assert!(errors.get("role").is_some());
        assert_eq!(errors.errors().len(), 5);
    }

    #[test]
    fn test_login_requires_password() {
        let errors = validate_login("user@example.com", "").unwrap_err();
        assert_eq!(errors.get("password"), Some("Password is required"));
        assert!(errors.get("email").is_none());
        assert!(validate_login("user@example.com", "x").is_ok());
    }

    #[test]
    fn test_venture_requires_category() {
        let errors = validate_venture("Café Origen", "", &[]).unwrap_err();
        assert_eq!(errors.get("categories"), Some("Select at least one category"));
    }

    #[test]
    fn test_venture_rejects_duplicate_categories() {
        let errors = validate_venture("Café Origen", "", &ids(&[COFFEE, COFFEE])).unwrap_err();
        assert_eq!(
            errors.get("categories"),
            Some("Each category can only be selected once")
        );
    }

    #[test]
    fn test_venture_valid() {
        let draft = validate_venture(" Café Origen ", "  ", &ids(&[COFFEE, CRAFTS])).unwrap();
        assert_eq!(draft.name, "Café Origen");
        assert_eq!(draft.description, None);
        assert_eq!(draft.categories.len(), 2);
    }

    #[test]
    fn test_product_valid() {
        let draft =
            validate_product("Beans", "Single origin", "$12.50", "0", &ids(&[COFFEE])).unwrap();
        assert_eq!(draft.price.to_string(), "$12.50");
        assert_eq!(draft.stock, 0);
        assert_eq!(draft.description.as_deref(), Some("Single origin"));
    }

    #[test]
    fn test_product_price_must_be_positive() {
        let errors = validate_product("Beans", "", "0", "3", &[]).unwrap_err();
        assert_eq!(errors.get("price"), Some("Price must be greater than zero"));

        let errors = validate_product("Beans", "", "free", "3", &[]).unwrap_err();
        assert_eq!(errors.get("price"), Some("Price must be a number"));

        let errors = validate_product("Beans", "", "2000000000", "3", &[]).unwrap_err();
        assert_eq!(
            errors.get("price"),
            Some("Price must be at most $1000000000.00")
        );
    }

    #[test]
    fn test_product_stock_rules() {
        let errors = validate_product("Beans", "", "1", "-1", &[]).unwrap_err();
        assert_eq!(errors.get("stock"), Some("Stock cannot be negative"));

        let errors = validate_product("Beans", "", "1", "2.5", &[]).unwrap_err();
        assert_eq!(errors.get("stock"), Some("Stock must be a whole number"));

        let errors = validate_product("Beans", "", "1", "", &[]).unwrap_err();
        assert_eq!(errors.get("stock"), Some("Stock is required"));
    }

    #[test]
    fn test_product_unknown_category() {
        let errors = validate_product("Beans", "", "1", "1", &ids(&["garbage"])).unwrap_err();
        assert_eq!(errors.get("categories"), Some("Unknown category"));
    }

    #[test]
    fn test_parse_quantity_input() {
        assert_eq!(parse_quantity(" 3 ").unwrap(), 3);
        assert_eq!(parse_quantity("0").unwrap(), 0);
        assert_eq!(
            parse_quantity("").unwrap_err().get("quantity"),
            Some("Enter a quantity")
        );
        assert_eq!(
            parse_quantity("-1").unwrap_err().get("quantity"),
            Some("Quantity cannot be negative")
        );
        assert_eq!(
            parse_quantity("two").unwrap_err().get("quantity"),
            Some("Quantity must be a whole number")
        );
        assert_eq!(
            parse_quantity("99999999999").unwrap_err().get("quantity"),
            Some("Quantity is too large")
        );
    }

    #[test]
    fn test_quantity_against_stock() {
        assert_eq!(validate_quantity(2, 5).unwrap(), 2);
        assert_eq!(
            validate_quantity(0, 5).unwrap_err().get("quantity"),
            Some("Quantity must be at least 1")
        );
        assert_eq!(
            validate_quantity(6, 5).unwrap_err().get("quantity"),
            Some("Only 5 left in stock")
        );
        assert_eq!(
            validate_quantity(1, 0).unwrap_err().get("quantity"),
            Some("This product is out of stock")
        );
    }

    #[test]
    fn test_error_display_summarises_fields() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "required");
        errors.push("price", "too low");
        assert_eq!(errors.to_string(), "invalid form: name: required; price: too low");
    }
}
