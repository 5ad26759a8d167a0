//! Backend REST client implementation.
//!
//! Uses `reqwest` for HTTP with JSON bodies. Caches category and venture
//! listings using `moka`; products and carts are never cached because stock
//! and quantities must reflect the latest server state.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use venture_market_core::validation::{Credentials, ProductDraft, Registration, VentureDraft};
use venture_market_core::{
    Cart, CartItemId, Category, CategoryId, Product, ProductId, User, UserId, Venture, VentureId,
};

use super::BackendError;
use super::cache::{CacheKey, CacheValue};
use super::types::{
    AddCartItemRequest, ErrorBody, LoginRequest, LoginResponse, LoginSession, ProductFilter,
    ProductRequest, RegisterRequest, UpdateCartItemRequest, VentureRequest,
};
use crate::config::BackendConfig;

/// Maximum number of body characters kept in error messages and logs.
const BODY_EXCERPT_CHARS: usize = 200;

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the marketplace REST backend.
///
/// Cheap to clone; all clones share the connection pool and cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("venture-market-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
                cache,
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build a request for `path` (relative, no leading slash).
    fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&SecretString>,
    ) -> Result<RequestBuilder, BackendError> {
        self.request_with_query(method, path, &[], token)
    }

    /// Build a request for `path` with query pairs appended.
    fn request_with_query(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        token: Option<&SecretString>,
    ) -> Result<RequestBuilder, BackendError> {
        let mut url = self.inner.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let builder = self.inner.client.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    /// Send a request and decode a JSON response body.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = check_status(request.send().await?).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %excerpt(&text),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// Send a request whose response body is ignored.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), BackendError> {
        check_status(request.send().await?).await?;
        Ok(())
    }

    /// Send a JSON body and decode the JSON response.
    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<T, BackendError> {
        self.send(request.json(body)).await
    }

    /// Drop every cached catalogue listing.
    fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
        debug!("Catalogue cache invalidated");
    }

    /// Check that the backend answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or answers with a
    /// non-success status.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), BackendError> {
        let request = self.request(Method::GET, "categories", None)?;
        self.send_empty(request).await
    }

    // =========================================================================
    // User Methods
    // =========================================================================

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Conflict` if the email is already registered.
    #[instrument(skip(self, registration), fields(email = %registration.email, role = %registration.role))]
    pub async fn register(&self, registration: &Registration) -> Result<User, BackendError> {
        let request = self.request(Method::POST, "users/register", None)?;
        self.send_json(request, &RegisterRequest::from(registration))
            .await
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` for wrong credentials.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginSession, BackendError> {
        let request = self.request(Method::POST, "users/login", None)?;
        let response: LoginResponse = self
            .send_json(request, &LoginRequest::from(credentials))
            .await?;
        Ok(response.into())
    }

    /// Get the user a token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` if the token is no longer valid.
    #[instrument(skip(self, token))]
    pub async fn current_user(&self, token: &SecretString) -> Result<User, BackendError> {
        let request = self.request(Method::GET, "users/me", Some(token))?;
        self.send(request).await
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let request = self.request(Method::GET, "categories", None)?;
        let categories: Vec<Category> = self.send(request).await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    /// Get one category.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the category does not exist.
    #[instrument(skip(self), fields(category = %id))]
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, BackendError> {
        let request = self.request(Method::GET, &format!("categories/{id}"), None)?;
        self.send(request).await
    }

    // =========================================================================
    // Venture Methods
    // =========================================================================

    /// List all ventures.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_ventures(&self) -> Result<Vec<Venture>, BackendError> {
        if let Some(CacheValue::Ventures(ventures)) =
            self.inner.cache.get(&CacheKey::Ventures).await
        {
            debug!("Cache hit for ventures");
            return Ok(ventures);
        }

        let request = self.request(Method::GET, "ventures", None)?;
        let ventures: Vec<Venture> = self.send(request).await?;

        self.inner
            .cache
            .insert(CacheKey::Ventures, CacheValue::Ventures(ventures.clone()))
            .await;

        Ok(ventures)
    }

    /// List the ventures owned by one user (never cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn list_ventures_by_owner(&self, owner: UserId) -> Result<Vec<Venture>, BackendError> {
        let request = self.request_with_query(
            Method::GET,
            "ventures",
            &[("owner", owner.to_string())],
            None,
        )?;
        self.send(request).await
    }

    /// Get one venture.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the venture does not exist.
    #[instrument(skip(self), fields(venture = %id))]
    pub async fn get_venture(&self, id: VentureId) -> Result<Venture, BackendError> {
        let request = self.request(Method::GET, &format!("ventures/{id}"), None)?;
        self.send(request).await
    }

    /// Create a venture owned by the token's user.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Forbidden` if the user is not an entrepreneur.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn create_venture(
        &self,
        token: &SecretString,
        draft: &VentureDraft,
    ) -> Result<Venture, BackendError> {
        let request = self.request(Method::POST, "ventures", Some(token))?;
        let venture = self
            .send_json(request, &VentureRequest::from(draft))
            .await?;
        self.invalidate_catalog();
        Ok(venture)
    }

    /// Replace a venture's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Forbidden` if the user does not own the venture.
    #[instrument(skip(self, token, draft), fields(venture = %id))]
    pub async fn update_venture(
        &self,
        token: &SecretString,
        id: VentureId,
        draft: &VentureDraft,
    ) -> Result<Venture, BackendError> {
        let request = self.request(Method::PUT, &format!("ventures/{id}"), Some(token))?;
        let venture = self
            .send_json(request, &VentureRequest::from(draft))
            .await?;
        self.invalidate_catalog();
        Ok(venture)
    }

    /// Delete a venture.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Forbidden` if the user does not own the venture.
    #[instrument(skip(self, token), fields(venture = %id))]
    pub async fn delete_venture(
        &self,
        token: &SecretString,
        id: VentureId,
    ) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, &format!("ventures/{id}"), Some(token))?;
        self.send_empty(request).await?;
        self.invalidate_catalog();
        Ok(())
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List products, optionally filtered by category and/or venture.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, BackendError> {
        let request =
            self.request_with_query(Method::GET, "products", &filter.query_pairs(), None)?;
        self.send(request).await
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, BackendError> {
        let request = self.request(Method::GET, &format!("products/{id}"), None)?;
        self.send(request).await
    }

    /// Create a product under a venture.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Forbidden` if the user does not own the venture.
    #[instrument(skip(self, token, draft), fields(venture = %venture, name = %draft.name))]
    pub async fn create_product(
        &self,
        token: &SecretString,
        venture: VentureId,
        draft: &ProductDraft,
    ) -> Result<Product, BackendError> {
        let request = self.request(Method::POST, "products", Some(token))?;
        let product = self
            .send_json(request, &ProductRequest::new(venture, draft))
            .await?;
        self.invalidate_catalog();
        Ok(product)
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Forbidden` if the user does not own the product.
    #[instrument(skip(self, token, draft), fields(product = %id))]
    pub async fn update_product(
        &self,
        token: &SecretString,
        id: ProductId,
        venture: VentureId,
        draft: &ProductDraft,
    ) -> Result<Product, BackendError> {
        let request = self.request(Method::PUT, &format!("products/{id}"), Some(token))?;
        let product = self
            .send_json(request, &ProductRequest::new(venture, draft))
            .await?;
        self.invalidate_catalog();
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Forbidden` if the user does not own the product.
    #[instrument(skip(self, token), fields(product = %id))]
    pub async fn delete_product(
        &self,
        token: &SecretString,
        id: ProductId,
    ) -> Result<(), BackendError> {
        let request = self.request(Method::DELETE, &format!("products/{id}"), Some(token))?;
        self.send_empty(request).await?;
        self.invalidate_catalog();
        Ok(())
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Get the token user's cart.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` if the token is no longer valid.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &SecretString) -> Result<Cart, BackendError> {
        let request = self.request(Method::GET, "cart", Some(token))?;
        self.send(request).await
    }

    /// Add units of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` if the backend refuses the quantity.
    #[instrument(skip(self, token), fields(product = %product))]
    pub async fn add_cart_item(
        &self,
        token: &SecretString,
        product: ProductId,
        quantity: u32,
    ) -> Result<Cart, BackendError> {
        let request = self.request(Method::POST, "cart/items", Some(token))?;
        let body = AddCartItemRequest {
            product_id: product,
            quantity,
        };
        self.send_json(request, &body).await
    }

    /// Set a cart line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the line does not exist.
    #[instrument(skip(self, token), fields(item = %item))]
    pub async fn update_cart_item(
        &self,
        token: &SecretString,
        item: CartItemId,
        quantity: u32,
    ) -> Result<Cart, BackendError> {
        let request = self.request(Method::PUT, &format!("cart/items/{item}"), Some(token))?;
        self.send_json(request, &UpdateCartItemRequest { quantity })
            .await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the line does not exist.
    #[instrument(skip(self, token), fields(item = %item))]
    pub async fn remove_cart_item(
        &self,
        token: &SecretString,
        item: CartItemId,
    ) -> Result<Cart, BackendError> {
        let request = self.request(Method::DELETE, &format!("cart/items/{item}"), Some(token))?;
        self.send(request).await
    }

    /// Remove every line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &SecretString) -> Result<Cart, BackendError> {
        let request = self.request(Method::DELETE, "cart", Some(token))?;
        self.send(request).await
    }
}

// =============================================================================
// Response Handling
// =============================================================================

/// Map non-success statuses to `BackendError`.
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(BackendError::RateLimited(retry_after));
    }

    let path = response.url().path().to_string();
    let text = response.text().await.unwrap_or_default();

    let err = match status {
        StatusCode::UNAUTHORIZED => BackendError::Unauthorized,
        StatusCode::FORBIDDEN => BackendError::Forbidden,
        StatusCode::NOT_FOUND => BackendError::NotFound(path),
        StatusCode::CONFLICT => BackendError::Conflict(error_message(&text)),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            BackendError::Rejected(error_message(&text))
        }
        _ => {
            tracing::error!(
                status = %status,
                body = %excerpt(&text),
                "Backend returned non-success status"
            );
            BackendError::Status {
                status: status.as_u16(),
                body: excerpt(&text),
            }
        }
    };

    debug!(status = %status, error = %err, "Backend request failed");
    Err(err)
}

/// Extract a human-readable message from an error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .map_or_else(|| excerpt(body), super::types::MessageField::into_text)
}

/// First `BODY_EXCERPT_CHARS` characters of a body.
fn excerpt(body: &str) -> String {
    body.trim().chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use venture_market_core::validation::{validate_login, validate_venture};

    const USER: &str = "aaaaaaaa-aaaa-4aaa-8aaa-aaaaaaaaaaaa";
    const VENTURE: &str = "22222222-2222-4222-8222-222222222222";
    const PRODUCT: &str = "11111111-1111-4111-8111-111111111111";
    const COFFEE: &str = "33333333-3333-4333-8333-333333333333";

    fn client(server: &MockServer) -> BackendClient {
        let config = BackendConfig {
            api_url: Url::parse(&server.url("/api/")).unwrap(),
            timeout: Duration::from_secs(5),
            catalog_cache_ttl: Duration::from_secs(60),
        };
        BackendClient::new(&config).unwrap()
    }

    fn token() -> SecretString {
        SecretString::from("tok-123")
    }

    fn user_json() -> serde_json::Value {
        json!({
            "externalId": USER,
            "role": "ENTREPRENEUR",
            "name": "María",
            "email": "maria@tienda.co"
        })
    }

    fn product_json(stock: u32) -> serde_json::Value {
        json!({
            "externalId": PRODUCT,
            "venture": {"externalId": VENTURE, "name": "Café Origen"},
            "name": "Beans",
            "price": 12.5,
            "stock": stock
        })
    }

    #[tokio::test]
    async fn test_login_returns_token_and_user() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/users/login")
                    .json_body(json!({"email": "maria@tienda.co", "password": "pw"}));
                then.status(200)
                    .json_body(json!({"token": "tok-123", "user": user_json()}));
            })
            .await;

        let creds = validate_login("maria@tienda.co", "pw").unwrap();
        let session = client(&server).login(&creds).await.unwrap();

        mock.assert_async().await;
        assert_eq!(session.token.expose_secret(), "tok-123");
        assert!(session.user.is_entrepreneur());
    }

    #[tokio::test]
    async fn test_login_wrong_credentials_is_unauthorized() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/users/login");
                then.status(401).json_body(json!({"message": "Bad credentials"}));
            })
            .await;

        let creds = validate_login("maria@tienda.co", "wrong").unwrap();
        let err = client(&server).login(&creds).await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_current_user_sends_bearer_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/users/me")
                    .header("authorization", "Bearer tok-123");
                then.status(200).json_body(user_json());
            })
            .await;

        let user = client(&server).current_user(&token()).await.unwrap();
        mock.assert_async().await;
        assert_eq!(user.name, "María");
    }

    #[tokio::test]
    async fn test_categories_are_cached() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/categories");
                then.status(200)
                    .json_body(json!([{"externalId": COFFEE, "name": "Coffee"}]));
            })
            .await;

        let client = client(&server);
        let first = client.list_categories().await.unwrap();
        let second = client.list_categories().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_venture_mutation_invalidates_cache() {
        let server = MockServer::start_async().await;
        let venture = json!({
            "externalId": VENTURE,
            "owner": USER,
            "name": "Café Origen",
            "categories": [{"externalId": COFFEE, "name": "Coffee"}]
        });
        let list = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/ventures");
                then.status(200).json_body(json!([venture.clone()]));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/ventures")
                    .header("authorization", "Bearer tok-123")
                    .json_body(json!({
                        "name": "Café Origen",
                        "description": null,
                        "categories": [COFFEE]
                    }));
                then.status(201).json_body(venture.clone());
            })
            .await;

        let client = client(&server);
        client.list_ventures().await.unwrap();
        client.list_ventures().await.unwrap();
        list.assert_hits_async(1).await;

        let draft = validate_venture("Café Origen", "", &[COFFEE.to_string()]).unwrap();
        let created = client.create_venture(&token(), &draft).await.unwrap();
        create.assert_async().await;
        assert_eq!(created.name, "Café Origen");

        client.list_ventures().await.unwrap();
        list.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_ventures_by_owner_uses_query() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/ventures")
                    .query_param("owner", USER);
                then.status(200).json_body(json!([]));
            })
            .await;

        let owner: UserId = USER.parse().unwrap();
        let ventures = client(&server).list_ventures_by_owner(owner).await.unwrap();
        mock.assert_async().await;
        assert!(ventures.is_empty());
    }

    #[tokio::test]
    async fn test_list_products_with_filter() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/products")
                    .query_param("category", COFFEE);
                then.status(200).json_body(json!([product_json(3)]));
            })
            .await;

        let filter = ProductFilter::category(COFFEE.parse().unwrap());
        let products = client(&server).list_products(filter).await.unwrap();
        mock.assert_async().await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].stock, 3);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/api/products/{PRODUCT}"));
                then.status(404);
            })
            .await;

        let err = client(&server)
            .get_product(PRODUCT.parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(ref path) if path.ends_with(PRODUCT)));
    }

    #[tokio::test]
    async fn test_add_cart_item_posts_body_and_returns_cart() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/cart/items")
                    .header("authorization", "Bearer tok-123")
                    .json_body(json!({"productId": PRODUCT, "quantity": 2}));
                then.status(200).json_body(json!({
                    "externalId": "55555555-5555-4555-8555-555555555555",
                    "items": [{
                        "externalId": "66666666-6666-4666-8666-666666666666",
                        "product": product_json(3),
                        "quantity": 2
                    }]
                }));
            })
            .await;

        let cart = client(&server)
            .add_cart_item(&token(), PRODUCT.parse().unwrap(), 2)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total().to_string(), "$25.00");
    }

    #[tokio::test]
    async fn test_rejected_message_is_kept() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path_contains("/api/cart/items/");
                then.status(422)
                    .json_body(json!({"message": ["quantity exceeds stock"]}));
            })
            .await;

        let err = client(&server)
            .update_cart_item(
                &token(),
                "66666666-6666-4666-8666-666666666666".parse().unwrap(),
                9,
            )
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), Some("quantity exceeds stock"));
    }

    #[tokio::test]
    async fn test_conflict_with_plain_text_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/users/register");
                then.status(409).body("Email already in use");
            })
            .await;

        let reg = venture_market_core::validation::validate_registration(
            "María",
            "maria@tienda.co",
            "s3cure-pass",
            "s3cure-pass",
            "CUSTOMER",
        )
        .unwrap();
        let err = client(&server).register(&reg).await.unwrap_err();
        assert!(matches!(err, BackendError::Conflict(ref msg) if msg == "Email already in use"));
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/cart");
                then.status(429).header("Retry-After", "30");
            })
            .await;

        let err = client(&server).get_cart(&token()).await.unwrap_err();
        assert!(matches!(err, BackendError::RateLimited(30)));
    }

    #[tokio::test]
    async fn test_server_error_keeps_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/cart");
                then.status(503).body("down for maintenance");
            })
            .await;

        let err = client(&server).clear_cart(&token()).await.unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_delete_product_accepts_no_content_and_invalidates_cache() {
        let server = MockServer::start_async().await;
        let categories = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/categories");
                then.status(200)
                    .json_body(json!([{"externalId": COFFEE, "name": "Coffee"}]));
            })
            .await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE).path(format!("/api/products/{PRODUCT}"));
                then.status(204);
            })
            .await;

        let client = client(&server);
        client.list_categories().await.unwrap();
        client
            .delete_product(&token(), PRODUCT.parse().unwrap())
            .await
            .unwrap();
        mock.assert_async().await;

        client.list_categories().await.unwrap();
        categories.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_out_of_range_price_is_parse_error() {
        let server = MockServer::start_async().await;
        let mut product = product_json(3);
        product["price"] = json!("50000000000000000000000000000");
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/api/products/{PRODUCT}"));
                then.status(200).json_body(product.clone());
            })
            .await;

        let err = client(&server)
            .get_product(PRODUCT.parse().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/categories");
                then.status(200).body("<html>oops</html>");
            })
            .await;

        let err = client(&server).list_categories().await.unwrap_err();
        assert!(matches!(err, BackendError::Parse(_)));
    }
}
