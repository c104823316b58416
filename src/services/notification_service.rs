//! Notification service.
//!
//! Writes in-app notification rows for client users. Callers on the send
//! path treat failures as non-blocking: a deliverable that was marked sent
//! stays sent even if the notification insert fails.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::notification::Notification;

pub struct NotificationService {
    db: PgPool,
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Notify a client that a deliverable is ready.
    pub async fn notify(
        &self,
        recipient_id: Uuid,
        project_name: &str,
        deliverable_title: &str,
    ) -> Result<Notification> {
        let title = format!("Deliverable ready: {}", deliverable_title);
        let body = format!(
            "\"{}\" has been delivered to your project {}.",
            deliverable_title, project_name
        );

        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, title, body)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, body, is_read, created_at
            "#,
        )
        .bind(recipient_id)
        .bind(&title)
        .bind(&body)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(notification)
    }

    /// List a page of notifications for a user, newest first, along with
    /// the total count.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<Notification>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, title, body, is_read, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((notifications, total))
    }

    /// Mark a notification as read. Only the recipient may do so.
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification not found".to_string()));
        }

        Ok(())
    }
}
