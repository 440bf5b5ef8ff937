//! Tests for services module
//!
//! These tests verify user resolution against an in-memory database:
//! - Create-on-first-sight
//! - Idempotent resolution (no writes when nothing changed)
//! - Admin flag reconciliation on login
//! - Duplicate-create race recovery and email-conflict rejection
//! - Admin promotion bootstrap policy against stored state

#[cfg(test)]
mod tests {
    use crate::auth::models::Claims;
    use crate::common::migrations::run_migrations;
    use crate::services::UserService;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;
    use std::collections::HashMap;

    const ADMIN_CLAIM: &str = "https://tenant.example.com/claims/is_admin";

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    fn claims(sub: &str, email: &str, admin: bool) -> Claims {
        let mut extra = HashMap::new();
        extra.insert(ADMIN_CLAIM.to_string(), serde_json::Value::Bool(admin));
        Claims {
            sub: sub.to_string(),
            email: Some(email.to_string()),
            name: Some("Test User".to_string()),
            exp: 0,
            extra,
        }
    }

    #[tokio::test]
    async fn test_get_or_create_creates_on_first_sight() {
        let service = UserService::new(test_pool().await);

        let user = service
            .get_or_create(&claims("auth0|abc", "abc@example.com", false), ADMIN_CLAIM)
            .await
            .expect("get_or_create failed");

        assert_eq!(user.user_id, "auth0|abc");
        assert_eq!(user.email, "abc@example.com");
        assert_eq!(user.name, Some("Test User".to_string()));
        assert!(!user.is_admin);
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let service = UserService::new(test_pool().await);
        let c = claims("auth0|abc", "abc@example.com", false);

        let first = service.get_or_create(&c, ADMIN_CLAIM).await.unwrap();
        let second = service.get_or_create(&c, ADMIN_CLAIM).await.unwrap();

        assert_eq!(first.user_id, second.user_id);
        assert_eq!(first.email, second.email);
        assert_eq!(first.created_at, second.created_at);
        assert!(!second.is_admin);
    }

    #[tokio::test]
    async fn test_admin_flag_reconciled_on_login() {
        let service = UserService::new(test_pool().await);

        let user = service
            .get_or_create(&claims("auth0|abc", "abc@example.com", false), ADMIN_CLAIM)
            .await
            .unwrap();
        assert!(!user.is_admin);

        // Provider now says admin: the flag is reconciled and persisted.
        let user = service
            .get_or_create(&claims("auth0|abc", "abc@example.com", true), ADMIN_CLAIM)
            .await
            .unwrap();
        assert!(user.is_admin);

        let stored = service.find_by_id("auth0|abc").await.unwrap().unwrap();
        assert!(stored.is_admin);

        // And back again when the claim is withdrawn.
        let user = service
            .get_or_create(&claims("auth0|abc", "abc@example.com", false), ADMIN_CLAIM)
            .await
            .unwrap();
        assert!(!user.is_admin);
    }

    #[tokio::test]
    async fn test_email_reuse_by_different_subject_is_rejected() {
        let service = UserService::new(test_pool().await);

        service
            .create(&claims("auth0|abc", "abc@example.com", false), false)
            .await
            .unwrap();

        // A different subject presenting an already-claimed email is a
        // conflict, not a concurrent-create race.
        let err = service
            .create(&claims("auth0|other", "abc@example.com", false), false)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::common::ApiError::BadRequest(_)));

        assert!(service.find_by_id("auth0|other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_promotion_policy_over_admin_lifecycle() {
        use crate::auth::handlers::may_promote;

        let service = UserService::new(test_pool().await);
        service
            .get_or_create(&claims("auth0|abc", "abc@example.com", false), ADMIN_CLAIM)
            .await
            .unwrap();

        // No admin yet: the first authenticated caller may bootstrap.
        assert!(may_promote(false, service.admin_exists().await.unwrap()));

        service.set_admin("auth0|abc", true).await.unwrap();

        // An admin exists: non-admins are blocked, admins may promote.
        assert!(!may_promote(false, service.admin_exists().await.unwrap()));
        assert!(may_promote(true, service.admin_exists().await.unwrap()));
    }

    #[tokio::test]
    async fn test_duplicate_create_resolves_to_existing_row() {
        let service = UserService::new(test_pool().await);

        let first = service
            .create(&claims("auth0|abc", "abc@example.com", false), false)
            .await
            .unwrap();

        // A losing racer hits the primary key and must get the winner's row.
        let second = service
            .create(&claims("auth0|abc", "other@example.com", false), false)
            .await
            .unwrap();

        assert_eq!(second.user_id, first.user_id);
        assert_eq!(second.email, "abc@example.com");
    }

    #[tokio::test]
    async fn test_find_by_email_and_set_admin() {
        let service = UserService::new(test_pool().await);

        service
            .get_or_create(&claims("auth0|abc", "abc@example.com", false), ADMIN_CLAIM)
            .await
            .unwrap();

        assert!(!service.admin_exists().await.unwrap());

        let user = service
            .find_by_email("abc@example.com")
            .await
            .unwrap()
            .expect("user should exist");
        service.set_admin(&user.user_id, true).await.unwrap();

        assert!(service.admin_exists().await.unwrap());
        let stored = service.find_by_id(&user.user_id).await.unwrap().unwrap();
        assert!(stored.is_admin);
    }

    #[tokio::test]
    async fn test_missing_email_defaults_to_empty_string() {
        let service = UserService::new(test_pool().await);

        let c = Claims {
            sub: "auth0|no-email".to_string(),
            email: None,
            name: None,
            exp: 0,
            extra: HashMap::new(),
        };

        let user = service.get_or_create(&c, ADMIN_CLAIM).await.unwrap();
        assert_eq!(user.email, "");
        assert_eq!(user.name, None);
        assert!(!user.is_admin);
    }
}
