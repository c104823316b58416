//! API module - HTTP handlers and middleware.

pub mod download_response;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use crate::config::Config;
use crate::services::deliverable_service::DeliverableService;
use crate::services::integrity_service::IntegrityService;
use crate::services::notification_service::NotificationService;
use crate::services::project_service::ProjectService;
use crate::services::rate_limit::RateLimiter;
use crate::storage::StorageBackend;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: PgPool,
    pub storage: Arc<dyn StorageBackend>,
    /// Shared sliding-window limiter for deliverable downloads
    pub download_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, db: PgPool, storage: Arc<dyn StorageBackend>) -> Self {
        let download_limiter = Arc::new(RateLimiter::new(
            config.download_rate_limit,
            config.download_rate_window_secs,
        ));
        Self {
            config,
            db,
            storage,
            download_limiter,
        }
    }

    /// Create a DeliverableService wired to the shared storage and limiter.
    pub fn deliverable_service(&self) -> DeliverableService {
        DeliverableService::new(
            self.db.clone(),
            self.storage.clone(),
            self.download_limiter.clone(),
            &self.config,
        )
    }

    /// Create an IntegrityService over the same two stores.
    pub fn integrity_service(&self) -> IntegrityService {
        IntegrityService::new(
            self.db.clone(),
            self.storage.clone(),
            Duration::from_secs(self.config.presign_expiry_secs),
        )
    }

    pub fn project_service(&self) -> ProjectService {
        ProjectService::new(self.db.clone())
    }

    pub fn notification_service(&self) -> NotificationService {
        NotificationService::new(self.db.clone())
    }
}

pub type SharedState = Arc<AppState>;
