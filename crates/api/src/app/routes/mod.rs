use axum::{
    Router,
    routing::{get, post},
};

pub mod orders;
pub mod products;
pub mod system;

/// Catalog browsing; no token required.
pub fn public_router() -> Router {
    Router::new()
        .route("/products", get(products::list_products))
        .route("/products/:id", get(products::get_product))
}

/// Endpoints scoped to the authenticated user.
pub fn protected_router() -> Router {
    Router::new()
        .route("/me", get(system::me))
        .route("/orders", post(orders::create_order).get(orders::list_orders))
        .route("/orders/:id", get(orders::get_order))
}
