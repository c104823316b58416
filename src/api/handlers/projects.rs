//! Project API handlers.
//!
//! Also mounts the project-scoped deliverable routes (list, create,
//! multipart upload) which live in the deliverables handler module.

use axum::extract::{DefaultBodyLimit, Extension, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use super::deliverables;
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::project::Project;
use crate::services::project_service::CreateProjectRequest;

#[derive(OpenApi)]
#[openapi(
    paths(list_projects, create_project, get_project),
    components(schemas(CreateProjectBody, Project))
)]
pub struct ProjectsApiDoc;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/:id", get(get_project))
        .route(
            "/:id/deliverables",
            get(deliverables::list_for_project).post(deliverables::create_url_deliverable),
        )
        .route(
            "/:id/deliverables/upload",
            post(deliverables::upload_file_deliverable),
        )
        // Hard cap on multipart bodies; the service enforces the
        // configured per-file limit below this.
        .layer(DefaultBodyLimit::max(256 * 1024 * 1024))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectBody {
    pub client_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// GET /api/v1/projects
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/projects",
    tag = "projects",
    operation_id = "list_projects",
    responses(
        (status = 200, description = "Projects visible to the caller", body = [Project]),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_projects(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
) -> Result<Json<Vec<Project>>> {
    let projects = state.project_service().list(&auth.requester()).await?;
    Ok(Json(projects))
}

/// POST /api/v1/projects
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/projects",
    tag = "projects",
    operation_id = "create_project",
    request_body = CreateProjectBody,
    responses(
        (status = 200, description = "Created project", body = Project),
        (status = 403, description = "Admin privileges required"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create_project(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<CreateProjectBody>,
) -> Result<Json<Project>> {
    let project = state
        .project_service()
        .create(
            &auth.requester(),
            CreateProjectRequest {
                client_id: payload.client_id,
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;
    Ok(Json(project))
}

/// GET /api/v1/projects/{id}
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/projects",
    tag = "projects",
    operation_id = "get_project",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_project(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>> {
    let project = state.project_service().get(&auth.requester(), id).await?;
    Ok(Json(project))
}
