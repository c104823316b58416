//! Deliverable API handlers.
//!
//! Project-scoped creation/list routes are mounted by the projects
//! router; everything addressed by deliverable id lives here.

use axum::extract::{Extension, Multipart, Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::dto::BulkIdsRequest;
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::models::deliverable::Deliverable;
use crate::services::deliverable_service::{
    BulkDownloadItem, BulkSummary, CreateFileDeliverableRequest, CreateUrlDeliverableRequest,
    DownloadTarget,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        list_for_project,
        create_url_deliverable,
        upload_file_deliverable,
        get_deliverable,
        send_deliverable,
        download_deliverable,
        delete_deliverable,
        bulk_send,
        bulk_delete,
        bulk_download
    ),
    components(schemas(
        Deliverable,
        CreateUrlDeliverableBody,
        BulkIdsRequest,
        BulkSummary,
        BulkDownloadItem,
        BulkDownloadResponse
    ))
)]
pub struct DeliverablesApiDoc;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/:id", get(get_deliverable).delete(delete_deliverable))
        .route("/:id/send", post(send_deliverable))
        .route("/:id/download", get(download_deliverable))
        .route("/bulk/send", post(bulk_send))
        .route("/bulk/delete", delete(bulk_delete))
        .route("/bulk/download", post(bulk_download))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUrlDeliverableBody {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkDownloadResponse {
    pub summary: BulkSummary,
    pub items: Vec<BulkDownloadItem>,
}

/// GET /api/v1/projects/{id}/deliverables
#[utoipa::path(
    get,
    path = "/{id}/deliverables",
    context_path = "/api/v1/projects",
    tag = "deliverables",
    operation_id = "list_deliverables",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Deliverables for the project", body = [Deliverable]),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_for_project(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Deliverable>>> {
    let deliverables = state
        .deliverable_service()
        .list_by_project(&auth.requester(), project_id)
        .await?;
    Ok(Json(deliverables))
}

/// POST /api/v1/projects/{id}/deliverables
#[utoipa::path(
    post,
    path = "/{id}/deliverables",
    context_path = "/api/v1/projects",
    tag = "deliverables",
    operation_id = "create_url_deliverable",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = CreateUrlDeliverableBody,
    responses(
        (status = 200, description = "Created deliverable", body = Deliverable),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn create_url_deliverable(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<CreateUrlDeliverableBody>,
) -> Result<Json<Deliverable>> {
    let deliverable = state
        .deliverable_service()
        .create_url(
            &auth.requester(),
            project_id,
            CreateUrlDeliverableRequest {
                title: payload.title,
                description: payload.description,
                url: payload.url,
            },
        )
        .await?;
    Ok(Json(deliverable))
}

/// POST /api/v1/projects/{id}/deliverables/upload
///
/// Multipart form fields: `file` (required), `title` (required),
/// `description`, `fallback_url`.
#[utoipa::path(
    post,
    path = "/{id}/deliverables/upload",
    context_path = "/api/v1/projects",
    tag = "deliverables",
    operation_id = "upload_file_deliverable",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Created deliverable", body = Deliverable),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn upload_file_deliverable(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(project_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Deliverable>> {
    let mut title = String::new();
    let mut description: Option<String> = None;
    let mut fallback_url: Option<String> = None;
    let mut filename = String::new();
    let mut payload: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => {
                title = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid title field: {}", e)))?;
            }
            "description" => {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Invalid description field: {}", e))
                })?;
                if !text.is_empty() {
                    description = Some(text);
                }
            }
            "fallback_url" => {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Invalid fallback_url field: {}", e))
                })?;
                if !text.is_empty() {
                    fallback_url = Some(text);
                }
            }
            "file" => {
                filename = field.file_name().unwrap_or_default().to_string();
                payload = Some(field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read file field: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let payload = payload.ok_or_else(|| AppError::Validation("file required".to_string()))?;

    let deliverable = state
        .deliverable_service()
        .create_file(
            &auth.requester(),
            project_id,
            CreateFileDeliverableRequest {
                title,
                description,
                filename,
                payload,
                fallback_url,
            },
        )
        .await?;
    Ok(Json(deliverable))
}

/// GET /api/v1/deliverables/{id}
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/deliverables",
    tag = "deliverables",
    operation_id = "get_deliverable",
    params(("id" = Uuid, Path, description = "Deliverable ID")),
    responses(
        (status = 200, description = "Deliverable", body = Deliverable),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn get_deliverable(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deliverable>> {
    let deliverable = state.deliverable_service().get(&auth.requester(), id).await?;
    Ok(Json(deliverable))
}

/// POST /api/v1/deliverables/{id}/send
#[utoipa::path(
    post,
    path = "/{id}/send",
    context_path = "/api/v1/deliverables",
    tag = "deliverables",
    operation_id = "send_deliverable",
    params(("id" = Uuid, Path, description = "Deliverable ID")),
    responses(
        (status = 200, description = "Deliverable after the transition", body = Deliverable),
        (status = 403, description = "Admin privileges required"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn send_deliverable(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deliverable>> {
    let deliverable = state.deliverable_service().send(&auth.requester(), id).await?;
    Ok(Json(deliverable))
}

/// GET /api/v1/deliverables/{id}/download
#[utoipa::path(
    get,
    path = "/{id}/download",
    context_path = "/api/v1/deliverables",
    tag = "deliverables",
    operation_id = "download_deliverable",
    params(("id" = Uuid, Path, description = "Deliverable ID")),
    responses(
        (status = 302, description = "Redirect to the deliverable location"),
        (status = 200, description = "Streamed file content"),
        (status = 429, description = "Download rate limit exceeded"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn download_deliverable(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<DownloadTarget> {
    state.deliverable_service().download(&auth.requester(), id).await
}

/// DELETE /api/v1/deliverables/{id}
#[utoipa::path(
    delete,
    path = "/{id}",
    context_path = "/api/v1/deliverables",
    tag = "deliverables",
    operation_id = "delete_deliverable",
    params(("id" = Uuid, Path, description = "Deliverable ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn delete_deliverable(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode> {
    state.deliverable_service().delete(&auth.requester(), id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// POST /api/v1/deliverables/bulk/send
#[utoipa::path(
    post,
    path = "/bulk/send",
    context_path = "/api/v1/deliverables",
    tag = "deliverables",
    operation_id = "bulk_send",
    request_body = BulkIdsRequest,
    responses(
        (status = 200, description = "Per-item outcomes", body = BulkSummary),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn bulk_send(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<BulkIdsRequest>,
) -> Result<Json<BulkSummary>> {
    let summary = state
        .deliverable_service()
        .send_many(&auth.requester(), &payload.ids)
        .await?;
    Ok(Json(summary))
}

/// DELETE /api/v1/deliverables/bulk/delete
#[utoipa::path(
    delete,
    path = "/bulk/delete",
    context_path = "/api/v1/deliverables",
    tag = "deliverables",
    operation_id = "bulk_delete",
    request_body = BulkIdsRequest,
    responses(
        (status = 200, description = "Per-item outcomes", body = BulkSummary),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn bulk_delete(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<BulkIdsRequest>,
) -> Result<Json<BulkSummary>> {
    let summary = state
        .deliverable_service()
        .delete_many(&auth.requester(), &payload.ids)
        .await?;
    Ok(Json(summary))
}

/// POST /api/v1/deliverables/bulk/download
#[utoipa::path(
    post,
    path = "/bulk/download",
    context_path = "/api/v1/deliverables",
    tag = "deliverables",
    operation_id = "bulk_download",
    request_body = BulkIdsRequest,
    responses(
        (status = 200, description = "Download links per item", body = BulkDownloadResponse),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn bulk_download(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<BulkIdsRequest>,
) -> Result<Json<BulkDownloadResponse>> {
    let (summary, items) = state
        .deliverable_service()
        .download_many(&auth.requester(), &payload.ids)
        .await?;
    Ok(Json(BulkDownloadResponse { summary, items }))
}
