//! Deliverable integrity scanner.
//!
//! Walks every file deliverable, checks its object against the store, and
//! reports or repairs the broken ones. The forward pass catches metadata
//! rows whose object is gone; the reverse sweep catches objects no row
//! references (e.g. uploads whose metadata insert failed).
//!
//! The scanner is idempotent: with no intervening writes, two runs report
//! the same broken set, and a reclassified deliverable is healthy on the
//! next pass.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::deliverable::DeliverableKind;
use crate::storage::StorageBackend;

/// Key prefix shared by all deliverable uploads.
const UPLOAD_PREFIX: &str = "projects/";

/// Why a file deliverable was classified as broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BrokenReason {
    /// The existence check found no object under the stored key
    MissingObject,
    /// The object exists but a signed URL could not be generated for it
    SignedUrlFailed,
}

/// A file deliverable whose stored object is missing or inaccessible.
#[derive(Debug, Serialize, ToSchema)]
pub struct BrokenDeliverable {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub reason: BrokenReason,
    /// Whether a fallback URL exists to reclassify with
    pub repairable: bool,
    /// Whether this run actually reclassified the deliverable
    pub repaired: bool,
}

/// Options for a scan run.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct ScanOptions {
    /// Reclassify broken deliverables that have a fallback URL
    #[serde(default)]
    pub repair: bool,
    /// Also list stored objects no metadata row references
    #[serde(default)]
    pub sweep_orphans: bool,
    /// Delete the orphaned objects found by the sweep
    #[serde(default)]
    pub delete_orphans: bool,
}

/// Result of an integrity scan.
#[derive(Debug, Serialize, ToSchema)]
pub struct IntegrityReport {
    /// Number of file deliverables examined
    pub scanned: i64,
    /// Number found healthy
    pub healthy: i64,
    pub broken: Vec<BrokenDeliverable>,
    /// Number reclassified to url-kind in this run
    pub repaired: i64,
    /// Stored object keys referenced by no deliverable
    pub orphaned_objects: Vec<String>,
    /// Number of orphaned objects deleted in this run
    pub orphans_deleted: i64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    fn empty() -> Self {
        Self {
            scanned: 0,
            healthy: 0,
            broken: Vec::new(),
            repaired: 0,
            orphaned_objects: Vec::new(),
            orphans_deleted: 0,
            errors: Vec::new(),
        }
    }
}

/// Classify a check outcome. `None` means healthy.
pub(crate) fn broken_reason(exists: bool, presign_ok: bool) -> Option<BrokenReason> {
    if !exists {
        Some(BrokenReason::MissingObject)
    } else if !presign_ok {
        Some(BrokenReason::SignedUrlFailed)
    } else {
        None
    }
}

/// Keys in `stored` that no metadata row references.
pub(crate) fn unreferenced_keys(stored: Vec<String>, referenced: &HashSet<String>) -> Vec<String> {
    stored
        .into_iter()
        .filter(|key| !referenced.contains(key))
        .collect()
}

/// Row shape used by the forward pass.
#[derive(Debug, sqlx::FromRow)]
struct FileDeliverableRow {
    id: Uuid,
    project_id: Uuid,
    title: String,
    url: Option<String>,
    file_path: String,
}

/// Deliverable integrity scanner
pub struct IntegrityService {
    db: PgPool,
    storage: Arc<dyn StorageBackend>,
    presign_expiry: Duration,
}

impl IntegrityService {
    pub fn new(db: PgPool, storage: Arc<dyn StorageBackend>, presign_expiry: Duration) -> Self {
        Self {
            db,
            storage,
            presign_expiry,
        }
    }

    /// Run a full scan.
    ///
    /// Only the initial metadata query can fail the run; every per-item
    /// problem is accumulated into the report instead.
    pub async fn scan(&self, opts: ScanOptions) -> Result<IntegrityReport> {
        let rows = sqlx::query_as::<_, FileDeliverableRow>(
            r#"
            SELECT id, project_id, title, url, file_path
            FROM deliverables
            WHERE kind = $1 AND file_path IS NOT NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(DeliverableKind::File)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let mut report = IntegrityReport::empty();
        report.scanned = rows.len() as i64;

        for row in &rows {
            match self.check_one(row, &mut report).await {
                Some(reason) => {
                    let repairable = row.url.is_some();
                    let mut repaired = false;
                    if opts.repair && repairable {
                        repaired = self.reclassify(row, &mut report).await;
                    }
                    report.broken.push(BrokenDeliverable {
                        id: row.id,
                        project_id: row.project_id,
                        title: row.title.clone(),
                        reason,
                        repairable,
                        repaired,
                    });
                }
                None => report.healthy += 1,
            }
        }

        if opts.sweep_orphans || opts.delete_orphans {
            self.sweep_orphans(opts.delete_orphans, &mut report).await;
        }

        if !report.broken.is_empty() || !report.orphaned_objects.is_empty() {
            tracing::info!(
                scanned = report.scanned,
                broken = report.broken.len(),
                repaired = report.repaired,
                orphans = report.orphaned_objects.len(),
                "Integrity scan found inconsistencies"
            );
        }

        Ok(report)
    }

    /// Check one file deliverable against the object store.
    async fn check_one(
        &self,
        row: &FileDeliverableRow,
        report: &mut IntegrityReport,
    ) -> Option<BrokenReason> {
        let exists = match self.storage.exists(&row.file_path).await {
            Ok(exists) => exists,
            Err(e) => {
                report
                    .errors
                    .push(format!("existence check for {}: {}", row.file_path, e));
                false
            }
        };
        if !exists {
            return broken_reason(false, true);
        }

        // Backends without presigning have nothing further to verify.
        if !self.storage.supports_redirect() {
            return None;
        }

        let presign_ok = match self
            .storage
            .get_presigned_url(&row.file_path, self.presign_expiry)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                report
                    .errors
                    .push(format!("signed url for {}: {}", row.file_path, e));
                false
            }
        };
        broken_reason(true, presign_ok)
    }

    /// Reclassify a broken file deliverable to its fallback URL, clearing
    /// the dangling file path. The guard on `url IS NOT NULL` keeps the
    /// location invariant even if the row changed since it was read.
    async fn reclassify(&self, row: &FileDeliverableRow, report: &mut IntegrityReport) -> bool {
        let result = sqlx::query(
            r#"
            UPDATE deliverables
            SET kind = $2, file_path = NULL, updated_at = NOW()
            WHERE id = $1 AND url IS NOT NULL
            "#,
        )
        .bind(row.id)
        .bind(DeliverableKind::Url)
        .execute(&self.db)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 1 => {
                tracing::info!(
                    deliverable_id = %row.id,
                    "Reclassified broken file deliverable to url"
                );
                report.repaired += 1;
                true
            }
            Ok(_) => {
                report
                    .errors
                    .push(format!("reclassify {}: row no longer repairable", row.id));
                false
            }
            Err(e) => {
                report
                    .errors
                    .push(format!("reclassify {}: {}", row.id, e));
                false
            }
        }
    }

    /// Find (and optionally delete) stored objects with no metadata row.
    async fn sweep_orphans(&self, delete: bool, report: &mut IntegrityReport) {
        let stored = match self.storage.list(UPLOAD_PREFIX).await {
            Ok(keys) => keys,
            Err(e) => {
                report.errors.push(format!("orphan sweep list: {}", e));
                return;
            }
        };

        let referenced: HashSet<String> = match sqlx::query_scalar::<_, String>(
            "SELECT file_path FROM deliverables WHERE file_path IS NOT NULL",
        )
        .fetch_all(&self.db)
        .await
        {
            Ok(paths) => paths.into_iter().collect(),
            Err(e) => {
                report.errors.push(format!("orphan sweep query: {}", e));
                return;
            }
        };

        let orphans = unreferenced_keys(stored, &referenced);

        if delete {
            for key in &orphans {
                match self.storage.delete(key).await {
                    Ok(()) => report.orphans_deleted += 1,
                    Err(e) => report.errors.push(format!("delete orphan {}: {}", key, e)),
                }
            }
        }

        report.orphaned_objects = orphans;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use bytes::Bytes;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Mutex;

    // -----------------------------------------------------------------------
    // broken_reason
    // -----------------------------------------------------------------------

    #[test]
    fn test_missing_object_wins_over_presign() {
        assert_eq!(
            broken_reason(false, false),
            Some(BrokenReason::MissingObject)
        );
        assert_eq!(broken_reason(false, true), Some(BrokenReason::MissingObject));
    }

    #[test]
    fn test_presign_failure_is_distinct() {
        assert_eq!(
            broken_reason(true, false),
            Some(BrokenReason::SignedUrlFailed)
        );
    }

    #[test]
    fn test_healthy_when_both_pass() {
        assert_eq!(broken_reason(true, true), None);
    }

    #[test]
    fn test_reason_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&BrokenReason::MissingObject).unwrap(),
            "\"missing_object\""
        );
        assert_eq!(
            serde_json::to_string(&BrokenReason::SignedUrlFailed).unwrap(),
            "\"signed_url_failed\""
        );
    }

    // -----------------------------------------------------------------------
    // unreferenced_keys
    // -----------------------------------------------------------------------

    #[test]
    fn test_unreferenced_keys_filters_referenced() {
        let stored = vec![
            "projects/p1/a.zip".to_string(),
            "projects/p1/b.pdf".to_string(),
            "projects/p2/c.png".to_string(),
        ];
        let referenced: HashSet<String> = ["projects/p1/a.zip", "projects/p2/c.png"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        assert_eq!(
            unreferenced_keys(stored, &referenced),
            vec!["projects/p1/b.pdf".to_string()]
        );
    }

    #[test]
    fn test_unreferenced_keys_empty_store() {
        let referenced: HashSet<String> = HashSet::new();
        assert!(unreferenced_keys(Vec::new(), &referenced).is_empty());
    }

    #[test]
    fn test_unreferenced_keys_all_orphaned() {
        let stored = vec!["projects/p1/a.zip".to_string()];
        let referenced: HashSet<String> = HashSet::new();
        assert_eq!(unreferenced_keys(stored, &referenced).len(), 1);
    }

    // -----------------------------------------------------------------------
    // check_one against a scripted storage backend
    // -----------------------------------------------------------------------

    /// Storage whose existence/presign answers are scripted per key.
    #[derive(Default)]
    struct ScriptedStorage {
        existing: Mutex<HashSet<String>>,
        presign_failures: Mutex<HashSet<String>>,
        redirect: bool,
    }

    impl ScriptedStorage {
        fn with_redirect() -> Self {
            Self {
                redirect: true,
                ..Default::default()
            }
        }

        fn add_object(&self, key: &str) {
            self.existing.lock().unwrap().insert(key.to_string());
        }

        fn fail_presign(&self, key: &str) {
            self.presign_failures.lock().unwrap().insert(key.to_string());
        }
    }

    #[async_trait]
    impl StorageBackend for ScriptedStorage {
        async fn put(&self, key: &str, _content: Bytes) -> crate::error::Result<()> {
            self.add_object(key);
            Ok(())
        }
        async fn get(&self, key: &str) -> crate::error::Result<Bytes> {
            if self.existing.lock().unwrap().contains(key) {
                Ok(Bytes::new())
            } else {
                Err(AppError::NotFound(format!("Storage key not found: {}", key)))
            }
        }
        async fn exists(&self, key: &str) -> crate::error::Result<bool> {
            Ok(self.existing.lock().unwrap().contains(key))
        }
        async fn delete(&self, key: &str) -> crate::error::Result<()> {
            self.existing.lock().unwrap().remove(key);
            Ok(())
        }
        async fn list(&self, prefix: &str) -> crate::error::Result<Vec<String>> {
            let mut keys: Vec<String> = self
                .existing
                .lock()
                .unwrap()
                .iter()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect();
            keys.sort();
            Ok(keys)
        }
        fn supports_redirect(&self) -> bool {
            self.redirect
        }
        async fn get_presigned_url(
            &self,
            key: &str,
            expires_in: Duration,
        ) -> crate::error::Result<Option<crate::storage::PresignedUrl>> {
            if self.presign_failures.lock().unwrap().contains(key) {
                return Err(AppError::ObjectStore(format!(
                    "Failed to generate presigned URL for '{}'",
                    key
                )));
            }
            Ok(Some(crate::storage::PresignedUrl {
                url: format!("https://store.example.com/{}?sig=abc", key),
                expires_in,
            }))
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

    fn row(file_path: &str, url: Option<&str>) -> FileDeliverableRow {
        FileDeliverableRow {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Logo Pack".to_string(),
            url: url.map(String::from),
            file_path: file_path.to_string(),
        }
    }

    fn service(storage: Arc<ScriptedStorage>) -> IntegrityService {
        IntegrityService::new(make_pool(), storage, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_check_one_healthy() {
        let storage = Arc::new(ScriptedStorage::with_redirect());
        storage.add_object("projects/p1/a.zip");
        let svc = service(storage);

        let mut report = IntegrityReport::empty();
        let reason = svc.check_one(&row("projects/p1/a.zip", None), &mut report).await;
        assert_eq!(reason, None);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_check_one_missing_object() {
        let storage = Arc::new(ScriptedStorage::with_redirect());
        let svc = service(storage);

        let mut report = IntegrityReport::empty();
        let reason = svc.check_one(&row("projects/p1/gone.zip", None), &mut report).await;
        assert_eq!(reason, Some(BrokenReason::MissingObject));
    }

    #[tokio::test]
    async fn test_check_one_presign_failure_distinguished() {
        let storage = Arc::new(ScriptedStorage::with_redirect());
        storage.add_object("projects/p1/a.zip");
        storage.fail_presign("projects/p1/a.zip");
        let svc = service(storage);

        let mut report = IntegrityReport::empty();
        let reason = svc.check_one(&row("projects/p1/a.zip", None), &mut report).await;
        assert_eq!(reason, Some(BrokenReason::SignedUrlFailed));
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_check_one_skips_presign_without_redirect_support() {
        // Filesystem-style backend: existence is the only verifiable claim
        let storage = Arc::new(ScriptedStorage::default());
        storage.add_object("projects/p1/a.zip");
        let svc = service(storage);

        let mut report = IntegrityReport::empty();
        let reason = svc.check_one(&row("projects/p1/a.zip", None), &mut report).await;
        assert_eq!(reason, None);
    }

    #[tokio::test]
    async fn test_check_one_is_repeatable() {
        // Same inputs, same classification - scan idempotence at item level
        let storage = Arc::new(ScriptedStorage::with_redirect());
        let svc = service(storage);
        let broken = row("projects/p1/gone.zip", Some("https://example.com/a"));

        let mut report = IntegrityReport::empty();
        let first = svc.check_one(&broken, &mut report).await;
        let second = svc.check_one(&broken, &mut report).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_scan_fails_only_on_initial_query() {
        // No database behind the lazy pool: the run itself must error
        let storage = Arc::new(ScriptedStorage::with_redirect());
        let svc = service(storage);
        let result = svc.scan(ScanOptions::default()).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[test]
    fn test_scan_options_deserialize_defaults() {
        let opts: ScanOptions = serde_json::from_str("{}").unwrap();
        assert!(!opts.repair);
        assert!(!opts.sweep_orphans);
        assert!(!opts.delete_orphans);
    }
}
