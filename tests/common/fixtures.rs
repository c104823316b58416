//! Database fixtures and service builders for integration tests.

use std::path::Path;
use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use handover_backend::config::Config;
use handover_backend::models::user::Requester;
use handover_backend::services::deliverable_service::DeliverableService;
use handover_backend::services::integrity_service::IntegrityService;
use handover_backend::services::rate_limit::RateLimiter;
use handover_backend::storage::filesystem::FilesystemStorage;
use handover_backend::storage::StorageBackend;

use super::test_id;

/// Config pointing at a temporary storage directory, with limits loose
/// enough not to interfere with test flows.
pub fn test_config(storage_path: &Path) -> Config {
    Config {
        database_url: String::new(),
        bind_address: "127.0.0.1:0".into(),
        storage_backend: "filesystem".into(),
        storage_path: storage_path.display().to_string(),
        jwt_secret: "integration-test-secret".into(),
        jwt_expiration_secs: 3600,
        max_upload_bytes: 10 * 1024 * 1024,
        allowed_extensions: vec!["pdf".into(), "zip".into(), "png".into()],
        presign_expiry_secs: 3600,
        download_rate_limit: 1000,
        download_rate_window_secs: 60,
        bulk_download_delay_ms: 0,
    }
}

/// Insert a client user and return its ID.
pub async fn create_client_user(pool: &PgPool) -> Uuid {
    let name = test_id();
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO users (username, email, password_hash, is_admin)
        VALUES ($1, $2, 'x', false)
        RETURNING id
        "#,
    )
    .bind(&name)
    .bind(format!("{}@clients.example", name))
    .fetch_one(pool)
    .await
    .expect("failed to create test client user")
}

/// Insert a project owned by the given client and return its ID.
pub async fn create_project(pool: &PgPool, client_id: Uuid, name: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO projects (client_id, name) VALUES ($1, $2) RETURNING id",
    )
    .bind(client_id)
    .bind(name)
    .fetch_one(pool)
    .await
    .expect("failed to create test project")
}

/// Count notification rows for a user.
pub async fn notification_count(pool: &PgPool, user_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("failed to count notifications")
}

/// An admin requester (no user row needed; services only check the flag).
pub fn admin() -> Requester {
    Requester {
        user_id: Uuid::new_v4(),
        is_admin: true,
    }
}

/// A client requester for an existing user row.
pub fn client(user_id: Uuid) -> Requester {
    Requester {
        user_id,
        is_admin: false,
    }
}

/// Build a DeliverableService over the given pool and storage directory.
pub fn deliverable_service(pool: &PgPool, storage_path: &Path) -> DeliverableService {
    let storage: Arc<dyn StorageBackend> = Arc::new(FilesystemStorage::new(storage_path));
    DeliverableService::new(
        pool.clone(),
        storage,
        Arc::new(RateLimiter::new(1000, 60)),
        &test_config(storage_path),
    )
}

/// Build an IntegrityService over the same pool and storage directory.
pub fn integrity_service(pool: &PgPool, storage_path: &Path) -> IntegrityService {
    let storage: Arc<dyn StorageBackend> = Arc::new(FilesystemStorage::new(storage_path));
    IntegrityService::new(pool.clone(), storage, std::time::Duration::from_secs(3600))
}
