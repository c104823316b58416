//! Deliverable lifecycle service.
//!
//! Handles deliverable creation (link or uploaded file), the one-way
//! draft-to-sent transition, rate-limited downloads, deletion, and the
//! bulk variants of each. File payloads go to the object store; metadata
//! rows live in PostgreSQL. The two stores share no transaction: an
//! upload whose metadata insert fails leaves an orphaned object behind
//! for the integrity sweep to find.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::deliverable::{Deliverable, DeliverableKind};
use crate::models::project::Project;
use crate::models::user::Requester;
use crate::services::notification_service::NotificationService;
use crate::services::rate_limit::RateLimiter;
use crate::services::validate;
use crate::storage::{PresignedUrl, StorageBackend};

/// Request to create a link deliverable.
#[derive(Debug)]
pub struct CreateUrlDeliverableRequest {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
}

/// Request to create a file deliverable.
///
/// `fallback_url` is an optional external mirror of the same artifact;
/// the integrity scanner uses it to reclassify the deliverable if the
/// stored object ever goes missing.
#[derive(Debug)]
pub struct CreateFileDeliverableRequest {
    pub title: String,
    pub description: Option<String>,
    pub filename: String,
    pub payload: Bytes,
    pub fallback_url: Option<String>,
}

/// Where a download request resolves to.
#[derive(Debug)]
pub enum DownloadTarget {
    /// Redirect to the deliverable's stored external URL
    ExternalUrl(String),
    /// Redirect to a time-limited presigned URL
    Presigned(PresignedUrl),
    /// Stream the object bytes directly (backends without presigning)
    Content {
        data: Bytes,
        content_type: String,
        filename: String,
    },
}

impl DownloadTarget {
    /// The sharable link for this target, if one exists.
    pub fn link(&self) -> Option<String> {
        match self {
            DownloadTarget::ExternalUrl(url) => Some(url.clone()),
            DownloadTarget::Presigned(presigned) => Some(presigned.url.clone()),
            DownloadTarget::Content { .. } => None,
        }
    }
}

/// Aggregate outcome of a bulk operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkSummary {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl BulkSummary {
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            succeeded: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, id: Uuid, error: &AppError) {
        self.failed += 1;
        self.errors.push(format!("{}: {}", id, error));
    }
}

/// Per-item result of a bulk download.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkDownloadItem {
    pub id: Uuid,
    /// Download link (external or presigned), when one could be produced
    pub url: Option<String>,
    pub error: Option<String>,
}

/// Generate a collision-resistant object key for an upload, scoped under
/// the owning project: `projects/{id}/{unix_millis}-{suffix}.{ext}`.
fn generate_file_key(project_id: Uuid, extension: &str) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    let suffix: String = (0..8)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();
    format!(
        "projects/{}/{}-{}.{}",
        project_id,
        Utc::now().timestamp_millis(),
        suffix,
        extension
    )
}

const DELIVERABLE_COLUMNS: &str =
    "id, project_id, title, description, kind, url, file_path, sent, sent_at, created_at, updated_at";

/// Deliverable lifecycle service
pub struct DeliverableService {
    db: PgPool,
    storage: Arc<dyn StorageBackend>,
    limiter: Arc<RateLimiter>,
    notifications: NotificationService,
    presign_expiry: Duration,
    max_upload_bytes: usize,
    allowed_extensions: Vec<String>,
    bulk_download_delay: Duration,
}

impl DeliverableService {
    /// Create a new deliverable service
    pub fn new(
        db: PgPool,
        storage: Arc<dyn StorageBackend>,
        limiter: Arc<RateLimiter>,
        config: &Config,
    ) -> Self {
        let notifications = NotificationService::new(db.clone());
        Self {
            db,
            storage,
            limiter,
            notifications,
            presign_expiry: Duration::from_secs(config.presign_expiry_secs),
            max_upload_bytes: config.max_upload_bytes,
            allowed_extensions: config.allowed_extensions.clone(),
            bulk_download_delay: Duration::from_millis(config.bulk_download_delay_ms),
        }
    }

    fn assert_admin(&self, actor: &Requester) -> Result<()> {
        if !actor.is_admin {
            return Err(AppError::Permission("Admin privileges required".into()));
        }
        Ok(())
    }

    async fn find_project(&self, project_id: Uuid) -> Result<Project> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, client_id, name, description, status, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
    }

    async fn find_deliverable(&self, id: Uuid) -> Result<Deliverable> {
        sqlx::query_as::<_, Deliverable>(&format!(
            "SELECT {} FROM deliverables WHERE id = $1",
            DELIVERABLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Deliverable not found".to_string()))
    }

    /// Create a link deliverable. Admin only.
    pub async fn create_url(
        &self,
        actor: &Requester,
        project_id: Uuid,
        req: CreateUrlDeliverableRequest,
    ) -> Result<Deliverable> {
        self.assert_admin(actor)?;
        let title = validate::normalize_title(&req.title)?;
        let url = validate::validate_url(&req.url)?;
        self.find_project(project_id).await?;

        let deliverable = sqlx::query_as::<_, Deliverable>(&format!(
            r#"
            INSERT INTO deliverables (project_id, title, description, kind, url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            DELIVERABLE_COLUMNS
        ))
        .bind(project_id)
        .bind(&title)
        .bind(&req.description)
        .bind(DeliverableKind::Url)
        .bind(&url)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(deliverable)
    }

    /// Create a file deliverable. Admin only.
    ///
    /// Validation happens before either store is touched. The payload is
    /// uploaded first; if the metadata insert then fails the object stays
    /// behind as an orphan until the next reverse sweep (no compensating
    /// delete, the stores are not transactional together).
    pub async fn create_file(
        &self,
        actor: &Requester,
        project_id: Uuid,
        req: CreateFileDeliverableRequest,
    ) -> Result<Deliverable> {
        self.assert_admin(actor)?;
        let title = validate::normalize_title(&req.title)?;
        let extension = validate::validate_file_payload(
            &req.filename,
            req.payload.len(),
            self.max_upload_bytes,
            &self.allowed_extensions,
        )?;
        let fallback_url = match req.fallback_url.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(validate::validate_url(raw)?),
            _ => None,
        };
        self.find_project(project_id).await?;

        let file_path = generate_file_key(project_id, &extension);
        self.storage.put(&file_path, req.payload).await?;

        let inserted = sqlx::query_as::<_, Deliverable>(&format!(
            r#"
            INSERT INTO deliverables (project_id, title, description, kind, url, file_path)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            DELIVERABLE_COLUMNS
        ))
        .bind(project_id)
        .bind(&title)
        .bind(&req.description)
        .bind(DeliverableKind::File)
        .bind(&fallback_url)
        .bind(&file_path)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()));

        match inserted {
            Ok(deliverable) => Ok(deliverable),
            Err(e) => {
                warn!(
                    key = %file_path,
                    "Metadata insert failed after upload, object left for integrity sweep: {}",
                    e
                );
                Err(e)
            }
        }
    }

    /// Get a deliverable, enforcing project visibility.
    pub async fn get(&self, actor: &Requester, id: Uuid) -> Result<Deliverable> {
        let deliverable = self.find_deliverable(id).await?;
        let project = self.find_project(deliverable.project_id).await?;
        if !project.viewable_by(actor.user_id, actor.is_admin) {
            return Err(AppError::Permission(
                "Not a member of this project".to_string(),
            ));
        }
        Ok(deliverable)
    }

    /// List deliverables for a project, newest first.
    pub async fn list_by_project(
        &self,
        actor: &Requester,
        project_id: Uuid,
    ) -> Result<Vec<Deliverable>> {
        let project = self.find_project(project_id).await?;
        if !project.viewable_by(actor.user_id, actor.is_admin) {
            return Err(AppError::Permission(
                "Not a member of this project".to_string(),
            ));
        }

        sqlx::query_as::<_, Deliverable>(&format!(
            "SELECT {} FROM deliverables WHERE project_id = $1 ORDER BY created_at DESC",
            DELIVERABLE_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a deliverable as sent and notify the owning client.
    ///
    /// The transition is a guarded single-statement update, so a repeated
    /// send is an idempotent no-op: the row keeps its original `sent_at`
    /// and no second notification goes out.
    pub async fn send(&self, actor: &Requester, id: Uuid) -> Result<Deliverable> {
        self.assert_admin(actor)?;

        let updated = sqlx::query_as::<_, Deliverable>(&format!(
            r#"
            UPDATE deliverables
            SET sent = true, sent_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND sent = false
            RETURNING {}
            "#,
            DELIVERABLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match updated {
            Some(deliverable) => {
                // Notification only fires after a confirmed transition,
                // and its failure never rolls the send back.
                match self.find_project(deliverable.project_id).await {
                    Ok(project) => {
                        if let Err(e) = self
                            .notifications
                            .notify(project.client_id, &project.name, &deliverable.title)
                            .await
                        {
                            warn!(
                                deliverable_id = %deliverable.id,
                                "Notification failed after send: {}",
                                e
                            );
                        }
                    }
                    Err(e) => {
                        warn!(
                            deliverable_id = %deliverable.id,
                            "Could not load project for send notification: {}",
                            e
                        );
                    }
                }
                Ok(deliverable)
            }
            // Zero rows matched: either already sent (return as-is) or missing
            None => self.find_deliverable(id).await,
        }
    }

    /// Resolve a download for a deliverable.
    ///
    /// The requester's rate-limit bucket is checked before anything else;
    /// an exceeded window returns without touching either store.
    pub async fn download(&self, actor: &Requester, id: Uuid) -> Result<DownloadTarget> {
        self.limiter.check(&actor.rate_limit_key()).await?;

        let deliverable = self.get(actor, id).await?;
        self.resolve_target(&deliverable).await
    }

    async fn resolve_target(&self, deliverable: &Deliverable) -> Result<DownloadTarget> {
        match deliverable.kind {
            DeliverableKind::Url => {
                let url = deliverable.url.clone().ok_or_else(|| {
                    AppError::Internal(format!("Deliverable {} has no url", deliverable.id))
                })?;
                Ok(DownloadTarget::ExternalUrl(url))
            }
            DeliverableKind::File => {
                let file_path = deliverable.file_path.clone().ok_or_else(|| {
                    AppError::Internal(format!("Deliverable {} has no file path", deliverable.id))
                })?;

                // A failed presign here is the live signal of a broken
                // deliverable, ahead of the batch scanner.
                if self.storage.supports_redirect() {
                    if let Some(presigned) = self
                        .storage
                        .get_presigned_url(&file_path, self.presign_expiry)
                        .await?
                    {
                        return Ok(DownloadTarget::Presigned(presigned));
                    }
                }

                let data = self.storage.get(&file_path).await?;
                let filename = file_path
                    .rsplit('/')
                    .next()
                    .unwrap_or(file_path.as_str())
                    .to_string();
                let content_type = mime_guess::from_path(&filename)
                    .first_or_octet_stream()
                    .to_string();
                Ok(DownloadTarget::Content {
                    data,
                    content_type,
                    filename,
                })
            }
        }
    }

    /// Delete a deliverable. Admin only.
    ///
    /// The metadata row goes first; the object delete afterwards is best
    /// effort. A failed object delete leaves an orphan that the reverse
    /// sweep reports later.
    pub async fn delete(&self, actor: &Requester, id: Uuid) -> Result<()> {
        self.assert_admin(actor)?;
        let deliverable = self.find_deliverable(id).await?;

        let result = sqlx::query("DELETE FROM deliverables WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Deliverable not found".to_string()));
        }

        if let Some(file_path) = &deliverable.file_path {
            if let Err(e) = self.storage.delete(file_path).await {
                warn!(
                    key = %file_path,
                    "Failed to delete object for removed deliverable: {}",
                    e
                );
            }
        }

        Ok(())
    }

    /// Send every deliverable in the set, accumulating per-item outcomes.
    pub async fn send_many(&self, actor: &Requester, ids: &[Uuid]) -> Result<BulkSummary> {
        self.assert_admin(actor)?;
        let mut summary = BulkSummary::new(ids.len());
        for id in ids {
            match self.send(actor, *id).await {
                Ok(_) => summary.record_success(),
                Err(e) => summary.record_failure(*id, &e),
            }
        }
        Ok(summary)
    }

    /// Delete every deliverable in the set, accumulating per-item outcomes.
    pub async fn delete_many(&self, actor: &Requester, ids: &[Uuid]) -> Result<BulkSummary> {
        self.assert_admin(actor)?;
        let mut summary = BulkSummary::new(ids.len());
        for id in ids {
            match self.delete(actor, *id).await {
                Ok(()) => summary.record_success(),
                Err(e) => summary.record_failure(*id, &e),
            }
        }
        Ok(summary)
    }

    /// Resolve download links for every deliverable in the set.
    ///
    /// Items are processed sequentially with a fixed inter-item delay so a
    /// large batch stays within the requester's rate-limit window.
    pub async fn download_many(
        &self,
        actor: &Requester,
        ids: &[Uuid],
    ) -> Result<(BulkSummary, Vec<BulkDownloadItem>)> {
        let mut summary = BulkSummary::new(ids.len());
        let mut items = Vec::with_capacity(ids.len());

        for (i, id) in ids.iter().enumerate() {
            if i > 0 && !self.bulk_download_delay.is_zero() {
                tokio::time::sleep(self.bulk_download_delay).await;
            }

            match self.download(actor, *id).await {
                Ok(target) => match target.link() {
                    Some(url) => {
                        summary.record_success();
                        items.push(BulkDownloadItem {
                            id: *id,
                            url: Some(url),
                            error: None,
                        });
                    }
                    None => {
                        let error = AppError::ObjectStore(
                            "backend does not support link generation".to_string(),
                        );
                        summary.record_failure(*id, &error);
                        items.push(BulkDownloadItem {
                            id: *id,
                            url: None,
                            error: Some(error.to_string()),
                        });
                    }
                },
                Err(e) => {
                    items.push(BulkDownloadItem {
                        id: *id,
                        url: None,
                        error: Some(e.to_string()),
                    });
                    summary.record_failure(*id, &e);
                }
            }
        }

        Ok((summary, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -----------------------------------------------------------------------
    // Mock storage backend for unit tests
    // -----------------------------------------------------------------------

    #[derive(Default)]
    struct MockStorage {
        puts: AtomicUsize,
        gets: AtomicUsize,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl StorageBackend for MockStorage {
        async fn put(&self, _key: &str, _content: Bytes) -> Result<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn get(&self, _key: &str) -> Result<Bytes> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::new())
        }
        async fn exists(&self, _key: &str) -> Result<bool> {
            Ok(true)
        }
        async fn delete(&self, _key: &str) -> Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn list(&self, _prefix: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn make_pool() -> PgPool {
        PgPoolOptions::new()
            .max_connections(1)
            .idle_timeout(Duration::from_secs(1))
            .connect_lazy_with(
                sqlx::postgres::PgConnectOptions::new()
                    .host("localhost")
                    .database("test"),
            )
    }

    fn test_config() -> Config {
        Config {
            database_url: "postgresql://localhost/test".into(),
            bind_address: "0.0.0.0:8080".into(),
            storage_backend: "filesystem".into(),
            storage_path: "/tmp/handover".into(),
            jwt_secret: "secret".into(),
            jwt_expiration_secs: 3600,
            max_upload_bytes: 1024,
            allowed_extensions: vec!["pdf".into(), "zip".into()],
            presign_expiry_secs: 3600,
            download_rate_limit: 1,
            download_rate_window_secs: 60,
            bulk_download_delay_ms: 0,
        }
    }

    fn make_service(storage: Arc<MockStorage>) -> DeliverableService {
        DeliverableService::new(
            make_pool(),
            storage,
            Arc::new(RateLimiter::new(1, 60)),
            &test_config(),
        )
    }

    fn admin() -> Requester {
        Requester {
            user_id: Uuid::new_v4(),
            is_admin: true,
        }
    }

    fn client() -> Requester {
        Requester {
            user_id: Uuid::new_v4(),
            is_admin: false,
        }
    }

    // -----------------------------------------------------------------------
    // generate_file_key
    // -----------------------------------------------------------------------

    #[test]
    fn test_file_key_is_project_scoped() {
        let project_id = Uuid::new_v4();
        let key = generate_file_key(project_id, "zip");
        assert!(key.starts_with(&format!("projects/{}/", project_id)));
        assert!(key.ends_with(".zip"));
    }

    #[test]
    fn test_file_keys_do_not_collide() {
        let project_id = Uuid::new_v4();
        let a = generate_file_key(project_id, "pdf");
        let b = generate_file_key(project_id, "pdf");
        assert_ne!(a, b);
    }

    // -----------------------------------------------------------------------
    // Validation ordering: bad input performs zero store writes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_oversized_file_rejected_with_zero_writes() {
        let storage = Arc::new(MockStorage::default());
        let service = make_service(storage.clone());

        let err = service
            .create_file(
                &admin(),
                Uuid::new_v4(),
                CreateFileDeliverableRequest {
                    title: "Logo Pack".into(),
                    description: None,
                    filename: "logo.zip".into(),
                    payload: Bytes::from(vec![0u8; 2048]), // limit is 1024
                    fallback_url: None,
                },
            )
            .await
            .unwrap_err();

        // Validation, not Database: the metadata store was never reached
        assert!(matches!(err, AppError::Validation(msg) if msg == "file rejected"));
        assert_eq!(storage.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_disallowed_extension_rejected_with_zero_writes() {
        let storage = Arc::new(MockStorage::default());
        let service = make_service(storage.clone());

        let err = service
            .create_file(
                &admin(),
                Uuid::new_v4(),
                CreateFileDeliverableRequest {
                    title: "Tool".into(),
                    description: None,
                    filename: "tool.exe".into(),
                    payload: Bytes::from_static(b"MZ"),
                    fallback_url: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(storage.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_title_rejected_before_any_store() {
        let storage = Arc::new(MockStorage::default());
        let service = make_service(storage.clone());

        let err = service
            .create_url(
                &admin(),
                Uuid::new_v4(),
                CreateUrlDeliverableRequest {
                    title: "  ".into(),
                    description: None,
                    url: "https://example.com".into(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(msg) if msg == "title required"));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected_before_any_store() {
        let storage = Arc::new(MockStorage::default());
        let service = make_service(storage.clone());

        let err = service
            .create_url(
                &admin(),
                Uuid::new_v4(),
                CreateUrlDeliverableRequest {
                    title: "Brief".into(),
                    description: None,
                    url: "ftp://example.com/brief".into(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(msg) if msg == "invalid url"));
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let storage = Arc::new(MockStorage::default());
        let service = make_service(storage.clone());

        let err = service
            .create_url(
                &client(),
                Uuid::new_v4(),
                CreateUrlDeliverableRequest {
                    title: "Brief".into(),
                    description: None,
                    url: "https://example.com".into(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Permission(_)));
        assert_eq!(storage.puts.load(Ordering::SeqCst), 0);
    }

    // -----------------------------------------------------------------------
    // Download rate limiting
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_download_over_limit_never_contacts_storage() {
        let storage = Arc::new(MockStorage::default());
        let service = make_service(storage.clone());
        let actor = client();
        let id = Uuid::new_v4();

        // First attempt passes the limiter and fails later (no database
        // behind the lazy pool).
        let first = service.download(&actor, id).await;
        assert!(matches!(first, Err(AppError::Database(_))));

        // Second attempt is blocked by the limiter before anything else.
        let second = service.download(&actor, id).await;
        assert!(matches!(second, Err(AppError::RateLimited { .. })));
        assert_eq!(storage.gets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rate_limit_keys_are_per_requester() {
        let storage = Arc::new(MockStorage::default());
        let service = make_service(storage.clone());
        let id = Uuid::new_v4();

        let a = client();
        let b = client();

        let _ = service.download(&a, id).await;
        // a is now exhausted, b is not
        assert!(matches!(
            service.download(&a, id).await,
            Err(AppError::RateLimited { .. })
        ));
        assert!(matches!(
            service.download(&b, id).await,
            Err(AppError::Database(_))
        ));
    }

    // -----------------------------------------------------------------------
    // DownloadTarget
    // -----------------------------------------------------------------------

    #[test]
    fn test_download_target_links() {
        assert_eq!(
            DownloadTarget::ExternalUrl("https://example.com/x".into()).link(),
            Some("https://example.com/x".to_string())
        );
        assert_eq!(
            DownloadTarget::Presigned(PresignedUrl {
                url: "https://s3.example.com/k?sig=abc".into(),
                expires_in: Duration::from_secs(3600),
            })
            .link(),
            Some("https://s3.example.com/k?sig=abc".to_string())
        );
        assert_eq!(
            DownloadTarget::Content {
                data: Bytes::new(),
                content_type: "application/zip".into(),
                filename: "a.zip".into(),
            }
            .link(),
            None
        );
    }

    // -----------------------------------------------------------------------
    // BulkSummary
    // -----------------------------------------------------------------------

    #[test]
    fn test_bulk_summary_counts() {
        let mut summary = BulkSummary::new(3);
        summary.record_success();
        summary.record_success();
        summary.record_failure(
            Uuid::new_v4(),
            &AppError::NotFound("Deliverable not found".into()),
        );

        assert_eq!(summary.requested, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("Deliverable not found"));
    }

    #[tokio::test]
    async fn test_bulk_send_requires_admin() {
        let storage = Arc::new(MockStorage::default());
        let service = make_service(storage);
        let err = service
            .send_many(&client(), &[Uuid::new_v4()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Permission(_)));
    }
}
