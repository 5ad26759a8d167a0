//! Integration test harness for the Venture Market storefront.
//!
//! Each test spawns the full storefront router on an ephemeral port, backed
//! by an `httpmock` server standing in for the marketplace REST API, and
//! drives it with a cookie-keeping `reqwest` client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p venture-market-integration-tests
//! ```
//!
//! # Test Files
//!
//! - `storefront_catalog` - Public pages, health checks, headers
//! - `storefront_auth` - Login, registration, logout, session revalidation
//! - `storefront_cart` - Customer cart fragments
//! - `storefront_dashboard` - Seller dashboard ownership and forms

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::HashMap;
use std::net::SocketAddr;

use httpmock::prelude::*;
use reqwest::{Client, Response, header::CONTENT_TYPE, redirect};
use serde_json::{Value, json};
use tower_sessions::MemoryStore;
use uuid::Uuid;

use venture_market_storefront::config::StorefrontConfig;
use venture_market_storefront::middleware::create_session_layer;
use venture_market_storefront::routes;
use venture_market_storefront::state::AppState;

pub const CUSTOMER_ID: Uuid = Uuid::from_u128(0x1111_1111_1111_4111_8111_1111_1111_1111);
pub const SELLER_ID: Uuid = Uuid::from_u128(0x2222_2222_2222_4222_8222_2222_2222_2222);
pub const OTHER_SELLER_ID: Uuid = Uuid::from_u128(0x2333_2333_2333_4333_8333_2333_2333_2333);
pub const COFFEE_ID: Uuid = Uuid::from_u128(0x3333_3333_3333_4333_8333_3333_3333_3333);
pub const VENTURE_ID: Uuid = Uuid::from_u128(0x4444_4444_4444_4444_8444_4444_4444_4444);
pub const PRODUCT_ID: Uuid = Uuid::from_u128(0x5555_5555_5555_4555_8555_5555_5555_5555);
pub const LINE_ID: Uuid = Uuid::from_u128(0x6666_6666_6666_4666_8666_6666_6666_6666);

/// A running storefront plus its mocked backend.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub backend: MockServer,
}

impl TestApp {
    /// Spawn with default settings.
    pub async fn spawn() -> Self {
        Self::spawn_with(&[]).await
    }

    /// Spawn with extra environment overrides.
    pub async fn spawn_with(overrides: &[(&str, &str)]) -> Self {
        let backend = MockServer::start_async().await;

        let mut vars: HashMap<String, String> = HashMap::from([
            ("BACKEND_API_URL".to_string(), backend.base_url()),
            (
                "STOREFRONT_BASE_URL".to_string(),
                "http://localhost:3000".to_string(),
            ),
            ("STOREFRONT_RATE_LIMIT".to_string(), "false".to_string()),
        ]);
        for (key, value) in overrides {
            vars.insert((*key).to_string(), (*value).to_string());
        }
        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let state = AppState::new(config.clone()).unwrap();
        let app = routes::app(state).layer(create_session_layer(MemoryStore::default(), &config));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            addr,
            client,
            backend,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// GET a storefront page.
    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// GET as htmx would.
    pub async fn htmx_get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("HX-Request", "true")
            .send()
            .await
            .unwrap()
    }

    /// POST an urlencoded form.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form_body(fields))
            .send()
            .await
            .unwrap()
    }

    /// POST an urlencoded form as htmx would.
    pub async fn htmx_post(&self, path: &str, fields: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("HX-Request", "true")
            .body(form_body(fields))
            .send()
            .await
            .unwrap()
    }

    /// Log in through the login form as the given user.
    pub async fn login(&self, user: Value) {
        let email = user["email"].as_str().unwrap().to_string();
        let mock = self
            .backend
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/users/login")
                    .json_body_partial(json!({"email": email}).to_string());
                then.status(200)
                    .json_body(json!({"token": format!("tok-{email}"), "user": user}));
            })
            .await;

        let response = self
            .post_form(
                "/auth/login",
                &[("email", &email), ("password", "correct-horse")],
            )
            .await;
        assert!(
            response.status().is_redirection(),
            "login failed with {}",
            response.status()
        );
        mock.assert_async().await;
    }

    /// Log in as the test customer.
    pub async fn login_customer(&self) {
        self.login(customer_json()).await;
    }

    /// Log in as the test seller.
    pub async fn login_seller(&self) {
        self.login(seller_json()).await;
    }
}

/// Encode form fields.
#[must_use]
pub fn form_body(fields: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// =============================================================================
// Backend fixtures
// =============================================================================

#[must_use]
pub fn customer_json() -> Value {
    json!({
        "externalId": CUSTOMER_ID,
        "role": "CUSTOMER",
        "name": "Ana Buyer",
        "email": "ana@example.com"
    })
}

#[must_use]
pub fn seller_json() -> Value {
    json!({
        "externalId": SELLER_ID,
        "role": "ENTREPRENEUR",
        "name": "Sam Maker",
        "email": "sam@example.com"
    })
}

#[must_use]
pub fn category_json() -> Value {
    json!({"externalId": COFFEE_ID, "name": "Coffee"})
}

#[must_use]
pub fn venture_json(owner: Uuid) -> Value {
    json!({
        "externalId": VENTURE_ID,
        "owner": owner,
        "name": "Café Origen",
        "description": "Single-origin beans roasted weekly",
        "categories": [category_json()]
    })
}

#[must_use]
pub fn product_json(stock: u32) -> Value {
    json!({
        "externalId": PRODUCT_ID,
        "venture": {"externalId": VENTURE_ID, "name": "Café Origen"},
        "name": "Dark Roast Beans",
        "description": "500g bag",
        "price": 12.5,
        "stock": stock,
        "categories": [category_json()]
    })
}

#[must_use]
pub fn cart_json(quantity: u32) -> Value {
    json!({
        "externalId": Uuid::from_u128(7),
        "items": [{
            "externalId": LINE_ID,
            "product": product_json(10),
            "quantity": quantity
        }]
    })
}
