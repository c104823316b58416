//! Project service.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::project::Project;
use crate::models::user::Requester;
use crate::services::validate;

/// Request to create a project.
#[derive(Debug)]
pub struct CreateProjectRequest {
    pub client_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

pub struct ProjectService {
    db: PgPool,
}

impl ProjectService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a project for a client. Admin only.
    pub async fn create(&self, actor: &Requester, req: CreateProjectRequest) -> Result<Project> {
        if !actor.is_admin {
            return Err(AppError::Permission("Admin privileges required".into()));
        }
        let name = validate::normalize_title(&req.name)
            .map_err(|_| AppError::Validation("project name required".into()))?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (client_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, client_id, name, description, status, created_at, updated_at
            "#,
        )
        .bind(req.client_id)
        .bind(&name)
        .bind(&req.description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(project)
    }

    /// Get a single project, enforcing visibility.
    pub async fn get(&self, actor: &Requester, id: Uuid) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, client_id, name, description, status, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

        if !project.viewable_by(actor.user_id, actor.is_admin) {
            return Err(AppError::Permission(
                "Not a member of this project".to_string(),
            ));
        }

        Ok(project)
    }

    /// List projects: admins see all, clients see their own.
    pub async fn list(&self, actor: &Requester) -> Result<Vec<Project>> {
        let projects = if actor.is_admin {
            sqlx::query_as::<_, Project>(
                r#"
                SELECT id, client_id, name, description, status, created_at, updated_at
                FROM projects
                ORDER BY created_at DESC
                "#,
            )
            .fetch_all(&self.db)
            .await
        } else {
            sqlx::query_as::<_, Project>(
                r#"
                SELECT id, client_id, name, description, status, created_at, updated_at
                FROM projects
                WHERE client_id = $1
                ORDER BY created_at DESC
                "#,
            )
            .bind(actor.user_id)
            .fetch_all(&self.db)
            .await
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(projects)
    }
}
