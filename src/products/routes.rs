use super::handlers;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

/// Creates the products router with all product-related routes
pub fn products_routes() -> Router {
    Router::new()
        .route("/products", get(handlers::get_products))
        .route("/products/:id", get(handlers::get_product))
        .route("/products/create", post(handlers::create_product))
        .route("/products/:id/update", put(handlers::update_product))
        .route("/products/:id/delete", delete(handlers::delete_product))
}
