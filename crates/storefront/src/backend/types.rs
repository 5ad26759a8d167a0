//! Request and response bodies for the backend REST contract.
//!
//! Entity records (`User`, `Venture`, `Product`, `Cart`, ...) come from
//! `venture-market-core`; this module only holds the shapes that exist purely
//! on the wire.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use venture_market_core::validation::{Credentials, ProductDraft, Registration, VentureDraft};
use venture_market_core::{CategoryId, Price, ProductId, Role, User, VentureId};

/// `POST /users/register` body.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: Role,
}

impl<'a> From<&'a Registration> for RegisterRequest<'a> {
    fn from(reg: &'a Registration) -> Self {
        Self {
            name: &reg.name,
            email: reg.email.as_str(),
            password: &reg.password,
            role: reg.role,
        }
    }
}

/// `POST /users/login` body.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl<'a> From<&'a Credentials> for LoginRequest<'a> {
    fn from(creds: &'a Credentials) -> Self {
        Self {
            email: creds.email.as_str(),
            password: &creds.password,
        }
    }
}

/// Raw `POST /users/login` response.
#[derive(Debug, Deserialize)]
pub(super) struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// A successful login: the bearer token and the user it belongs to.
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub token: SecretString,
    pub user: User,
}

impl From<LoginResponse> for LoginSession {
    fn from(raw: LoginResponse) -> Self {
        Self {
            token: SecretString::from(raw.token),
            user: raw.user,
        }
    }
}

/// `POST /ventures` and `PUT /ventures/{id}` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VentureRequest<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub categories: &'a [CategoryId],
}

impl<'a> From<&'a VentureDraft> for VentureRequest<'a> {
    fn from(draft: &'a VentureDraft) -> Self {
        Self {
            name: &draft.name,
            description: draft.description.as_deref(),
            categories: &draft.categories,
        }
    }
}

/// `POST /products` and `PUT /products/{id}` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest<'a> {
    pub venture_id: VentureId,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price: Price,
    pub stock: u32,
    pub categories: &'a [CategoryId],
}

impl<'a> ProductRequest<'a> {
    /// Build the body for a product under `venture_id`.
    #[must_use]
    pub fn new(venture_id: VentureId, draft: &'a ProductDraft) -> Self {
        Self {
            venture_id,
            name: &draft.name,
            description: draft.description.as_deref(),
            price: draft.price,
            stock: draft.stock,
            categories: &draft.categories,
        }
    }
}

/// `POST /cart/items` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// `PUT /cart/items/{id}` body.
#[derive(Debug, Serialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

/// Filters for `GET /products`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<CategoryId>,
    pub venture: Option<VentureId>,
}

impl ProductFilter {
    /// Products in one category.
    #[must_use]
    pub const fn category(id: CategoryId) -> Self {
        Self {
            category: Some(id),
            venture: None,
        }
    }

    /// Products of one venture.
    #[must_use]
    pub const fn venture(id: VentureId) -> Self {
        Self {
            category: None,
            venture: Some(id),
        }
    }

    /// Query pairs to append to the request URL.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(venture) = self.venture {
            pairs.push(("venture", venture.to_string()));
        }
        pairs
    }
}

/// Error body the backend sends with 4xx responses.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub message: Option<MessageField>,
    #[serde(default)]
    pub error: Option<MessageField>,
}

/// A message given either as one string or as a list of strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum MessageField {
    One(String),
    Many(Vec<String>),
}

impl MessageField {
    pub(super) fn into_text(self) -> String {
        match self {
            Self::One(s) => s,
            Self::Many(list) => list.join("; "),
        }
    }
}
