//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                           - Welcome message
//! GET    /api/health                 - Health check
//!
//! # Auth (rate limited)
//! POST   /api/auth/register          - Create an account, returns a token
//! POST   /api/auth/login             - Exchange credentials for a token
//! POST   /api/auth/logout            - Stateless logout
//! GET    /api/auth/profile           - Current user (requires token)
//!
//! # Products
//! GET    /api/products               - Product listing
//! GET    /api/products/{id}          - Product detail
//! POST   /api/products               - Create (seller)
//! PUT    /api/products/{id}          - Replace (seller)
//! DELETE /api/products/{id}          - Delete (seller)
//!
//! # Cart (requires token)
//! GET    /api/cart                   - Current cart
//! DELETE /api/cart                   - Clear cart
//! POST   /api/cart/items             - Add item
//! PUT    /api/cart/items/{productId} - Set quantity (0 removes)
//! DELETE /api/cart/items/{productId} - Remove item
//! ```
//!
//! Anything else gets 404 `{"message": "Route not found"}`.

pub mod auth;
pub mod cart;
pub mod health;
pub mod products;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    routing::{get, post, put},
};

use crate::error::{AppError, Result};
use crate::middleware::rate_limit::RateLimiterLayer;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes(rate_limiter: RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .layer(rate_limiter)
        // Profile reads are not rate limited.
        .route("/profile", get(auth::profile))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{product_id}", put(cart::update).delete(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes(rate_limiter: RateLimiterLayer) -> Router<AppState> {
    Router::new()
        .route("/", get(health::welcome))
        .route("/api/health", get(health::health))
        .nest("/api/auth", auth_routes(rate_limiter))
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .fallback(health::not_found)
}

/// Unwrap a JSON body, turning axum's rejection into a 400.
///
/// Handlers take `Result<Json<T>, JsonRejection>` so malformed bodies use the
/// same `{"message"}` shape as every other error.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}
