//! # Products Module
//!
//! This module handles all product-related functionality including:
//! - Product CRUD operations
//! - Input validation (name, price, quantity bounds)
//! - Ownership-or-admin access control on mutations

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;


pub use routes::products_routes;
