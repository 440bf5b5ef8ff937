// src/products/validators.rs

use super::models::{CreateProductRequest, UpdateProductRequest};
use crate::common::{ValidationResult, Validator};

// ============================================================================
// Product Validators
// ============================================================================

pub struct ProductValidator;

impl Validator<CreateProductRequest> for ProductValidator {
    fn validate(&self, data: &CreateProductRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.name.trim().is_empty() {
            result.add_error("name", "Name is required");
        } else if data.name.len() > 64 {
            result.add_error("name", "Name must be less than 64 characters");
        }

        if let Some(description) = &data.description {
            if description.len() > 120 {
                result.add_error(
                    "description",
                    "Description must be less than 120 characters",
                );
            }
        }

        if data.price <= 0.0 {
            result.add_error("price", "Price must be higher than 0.");
        }

        if data.quantity <= 0 {
            result.add_error("quantity", "Quantity must be higher than 0.");
        }

        result
    }
}

impl Validator<UpdateProductRequest> for ProductValidator {
    fn validate(&self, data: &UpdateProductRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(description) = &data.description {
            if description.len() > 120 {
                result.add_error(
                    "description",
                    "Description must be less than 120 characters",
                );
            }
        }

        if let Some(price) = data.price {
            if price <= 0.0 {
                result.add_error("price", "Price must be higher than 0.");
            }
        }

        if let Some(quantity) = data.quantity {
            if quantity <= 0 {
                result.add_error("quantity", "Quantity must be higher than 0.");
            }
        }

        result
    }
}

/// Ownership-or-admin rule for mutation endpoints.
pub fn owner_or_admin(owner_id: &str, user_id: &str, is_admin: bool) -> bool {
    owner_id == user_id || is_admin
}
