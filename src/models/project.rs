//! Project model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Project entity. Every deliverable belongs to exactly one project, and
/// every project is owned by one client user.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Whether the given requester may view this project (and its
    /// deliverables).
    pub fn viewable_by(&self, user_id: Uuid, is_admin: bool) -> bool {
        is_admin || self.client_id == user_id
    }
}
