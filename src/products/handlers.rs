//! Product CRUD handlers
//!
//! Reads are public. Mutations require authentication; update and delete
//! additionally require the caller to own the product or be an admin.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::models::{CreateProductRequest, MessageResponse, Product, UpdateProductRequest};
use super::validators::{owner_or_admin, ProductValidator};
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, Validator};

/// GET /products - List all products
pub async fn get_products(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let state = state_lock.read().await.clone();

    let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY id")
        .fetch_all(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    Ok(Json(products))
}

/// GET /products/:id - Get a single product
pub async fn get_product(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(product_id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    let state = state_lock.read().await.clone();

    let product = fetch_product(&state, product_id).await?;
    Ok(Json(product))
}

/// POST /products/create - Create a new product owned by the caller
pub async fn create_product(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    let result = ProductValidator.validate(&request);
    if !result.is_valid() {
        return Err(result.into());
    }

    sqlx::query(
        "INSERT INTO products (name, description, price, quantity, user_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&request.name)
    .bind(request.description.as_deref())
    .bind(request.price)
    .bind(request.quantity)
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    info!(user_id = %authed.id, name = %request.name, "Product created");

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Product added successfully!".to_string(),
        }),
    ))
}

/// PUT /products/:id/update - Update a product (owner or admin)
pub async fn update_product(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(product_id): Path<i64>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let mut product = fetch_product(&state, product_id).await?;

    if !owner_or_admin(&product.user_id, &authed.id, authed.is_admin) {
        warn!(
            user_id = %authed.id,
            product_id,
            owner_id = %product.user_id,
            "Product update denied"
        );
        return Err(ApiError::Forbidden(
            "You don't have permission to edit this product.".to_string(),
        ));
    }

    let result = ProductValidator.validate(&request);
    if !result.is_valid() {
        return Err(result.into());
    }

    if let Some(description) = request.description {
        product.description = Some(description);
    }
    if let Some(price) = request.price {
        product.price = price;
    }
    if let Some(quantity) = request.quantity {
        product.quantity = quantity;
    }

    sqlx::query("UPDATE products SET description = ?, price = ?, quantity = ? WHERE id = ?")
        .bind(product.description.as_deref())
        .bind(product.price)
        .bind(product.quantity)
        .bind(product_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(user_id = %authed.id, product_id, "Product updated");

    Ok(Json(MessageResponse {
        message: "Product updated successfully.".to_string(),
    }))
}

/// DELETE /products/:id/delete - Delete a product (owner or admin)
pub async fn delete_product(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(product_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let product = fetch_product(&state, product_id).await?;

    if !owner_or_admin(&product.user_id, &authed.id, authed.is_admin) {
        warn!(
            user_id = %authed.id,
            product_id,
            owner_id = %product.user_id,
            "Product delete denied"
        );
        return Err(ApiError::Forbidden(
            "You don't have permission to delete this product.".to_string(),
        ));
    }

    sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(product_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(user_id = %authed.id, product_id, "Product deleted");

    Ok(Json(MessageResponse {
        message: "Product deleted successfully.".to_string(),
    }))
}

async fn fetch_product(state: &AppState, product_id: i64) -> Result<Product, ApiError> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(product_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("Product not found.".to_string()))
}
