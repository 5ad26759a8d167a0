//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, error capture; added in `main`)
//! 2. Session layer (tower-sessions, `PostgreSQL` or in-memory store)
//! 3. `TraceLayer` (request span with `request_id` and `user_id` fields)
//! 4. Request ID (add unique ID to each request)
//! 5. CSP nonce (generate per-request nonce for scripts)
//! 6. Security headers (CSP, frame and isolation policies)
//! 7. Auth initialization (re-validate token, expose auth state)
//! 8. Rate limiting on auth and cart routes (governor)

pub mod auth;
pub mod csp;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, OptionalAuth, RequireAuth, RequireCustomer, RequireEntrepreneur,
    initialize_auth,
};
pub use csp::{CspNonce, csp_nonce_middleware};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
