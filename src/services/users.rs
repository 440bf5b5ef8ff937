// src/services/users.rs
//! User directory adapter
//!
//! Maps verified identity claims to local user records. A previously unseen
//! subject id gets a row on first sight; on every later login the admin flag
//! is reconciled against the claim-derived value. Resolving an unchanged
//! user performs no writes.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::auth::models::{Claims, User};
use crate::common::{safe_email_log, ApiError};

pub struct UserService {
    db: SqlitePool,
}

impl UserService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Resolve the local user for a verified claim set, creating one on
    /// first sight and reconciling the admin flag when it changed.
    pub async fn get_or_create(&self, claims: &Claims, admin_claim: &str) -> Result<User, ApiError> {
        let wants_admin = claims.admin_flag(admin_claim);

        let existing = self.find_by_id(&claims.sub).await?;

        match existing {
            Some(user) => {
                if user.is_admin != wants_admin {
                    info!(
                        user_id = %user.user_id,
                        is_admin = wants_admin,
                        "Reconciling admin flag from identity provider claim"
                    );
                    self.set_admin(&user.user_id, wants_admin).await?;
                    return Ok(User {
                        is_admin: wants_admin,
                        ..user
                    });
                }
                debug!(user_id = %user.user_id, "User already exists");
                Ok(user)
            }
            None => self.create(claims, wants_admin).await,
        }
    }

    /// Insert a new user row. Two concurrent requests may race to create the
    /// same subject; the primary key is the backstop, and the loser of the
    /// race re-fetches the winner's row instead of failing.
    pub(crate) async fn create(&self, claims: &Claims, is_admin: bool) -> Result<User, ApiError> {
        let email = claims.email.clone().unwrap_or_default();

        info!(
            user_id = %claims.sub,
            email = %safe_email_log(&email),
            "User not found, creating new user"
        );

        let inserted = sqlx::query(
            "INSERT INTO users (user_id, email, name, is_admin) VALUES (?, ?, ?, ?)",
        )
        .bind(&claims.sub)
        .bind(&email)
        .bind(claims.name.as_deref())
        .bind(is_admin)
        .execute(&self.db)
        .await;

        if let Err(e) = inserted {
            let duplicate = e
                .as_database_error()
                .map(|db_err| db_err.is_unique_violation())
                .unwrap_or(false);
            if !duplicate {
                return Err(ApiError::DatabaseError(e));
            }
            // The violated constraint is either the subject primary key (a
            // concurrent create of the same user, which leaves a row to fall
            // back to) or the email uniqueness (a different subject reusing
            // an address, which leaves none).
            if let Some(user) = self.find_by_id(&claims.sub).await? {
                warn!(
                    user_id = %claims.sub,
                    "Concurrent create detected, returning existing user"
                );
                return Ok(user);
            }
            warn!(
                user_id = %claims.sub,
                email = %safe_email_log(&email),
                "Email already belongs to a different account"
            );
            return Err(ApiError::BadRequest(
                "Email is already associated with another account".to_string(),
            ));
        }

        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
            .bind(&claims.sub)
            .fetch_one(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }

    pub async fn set_admin(&self, user_id: &str, is_admin: bool) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET is_admin = ? WHERE user_id = ?")
            .bind(is_admin)
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(())
    }

    /// Whether any admin exists at all. Drives the promotion bootstrap policy.
    pub async fn admin_exists(&self) -> Result<bool, ApiError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE is_admin = 1")
            .fetch_one(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;
        Ok(count > 0)
    }

    pub async fn list_all(&self) -> Result<Vec<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }
}
