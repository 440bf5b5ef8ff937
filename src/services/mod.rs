// src/services/mod.rs
//
// Shared services module containing business logic services
// that can be used across different domain modules

pub mod management;
pub mod users;

#[cfg(test)]
mod tests;

// Re-export commonly used types for convenience
pub use management::ManagementService;
pub use users::UserService;
