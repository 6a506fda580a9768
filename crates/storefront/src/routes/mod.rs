//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog page (?q=&category=&sort=)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (product cache readable)
//!
//! # Products
//! GET  /products/{id}          - Product detail fragment (modal)
//! GET  /api/products           - Filtered catalog (JSON, same query as /)
//! GET  /api/categories         - Category list (JSON)
//!
//! # Cart
//! GET  /cart                   - Cart panel fragment
//! GET  /cart/count             - Cart count badge fragment
//! POST /cart/add               - Add to cart (notice JSON, triggers cart-updated)
//! POST /cart/update            - Set quantity (cart_items fragment)
//! POST /cart/remove            - Remove line (cart_items fragment)
//! GET  /api/cart               - Cart summary (JSON)
//!
//! # Checkout
//! POST /checkout               - Place order (notice JSON)
//! GET  /api/cep/{code}         - CEP address lookup (JSON)
//! ```

pub mod address;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::api_index))
        .route("/categories", get(products::api_categories))
        .route("/cart", get(cart::api_show))
        .route("/cep/{code}", get(address::lookup))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/products/{id}", get(products::show))
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::submit))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the product cache cannot be read.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.products().get().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Product cache unreadable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
