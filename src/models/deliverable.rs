//! Deliverable model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Deliverable kind enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "deliverable_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliverableKind {
    Url,
    File,
}

/// Deliverable entity - one artifact promised to a client for a project.
///
/// Location invariant: a `url` deliverable carries `url` and never
/// `file_path`; a `file` deliverable always carries `file_path` and may
/// carry a fallback `url` which the integrity scanner uses for repair.
/// `sent` transitions false to true exactly once; `sent_at` is set at that
/// transition and never changes afterwards.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct Deliverable {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub kind: DeliverableKind,
    pub url: Option<String>,
    pub file_path: Option<String>,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deliverable {
    /// Check the location invariant for this row.
    pub fn location_consistent(&self) -> bool {
        match self.kind {
            DeliverableKind::Url => self.url.is_some() && self.file_path.is_none(),
            DeliverableKind::File => self.file_path.is_some(),
        }
    }
}
