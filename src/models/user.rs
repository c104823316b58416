//! User model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// User entity. Admin users manage every project; client users only see
/// their own.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The identity on whose behalf a core operation runs.
///
/// Passed explicitly into every service call so permission checks and
/// rate-limit keys never depend on ambient session state.
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Requester {
    /// Rate-limit bucket key for this requester.
    pub fn rate_limit_key(&self) -> String {
        format!("user:{}", self.user_id)
    }
}
