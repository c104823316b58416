//! Notification API handlers.

use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::api::dto::{Pagination, PaginationQuery};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::notification::Notification;

#[derive(OpenApi)]
#[openapi(
    paths(list_notifications, mark_notification_read),
    components(schemas(Notification, NotificationListResponse, Pagination))
)]
pub struct NotificationsApiDoc;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", post(mark_notification_read))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub items: Vec<Notification>,
    pub pagination: Pagination,
}

/// GET /api/v1/notifications
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/notifications",
    tag = "notifications",
    operation_id = "list_notifications",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Notifications for the caller", body = NotificationListResponse),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn list_notifications(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<NotificationListResponse>> {
    let per_page = query.per_page();
    let offset = (query.page().saturating_sub(1)) * per_page;
    let (items, total) = state
        .notification_service()
        .list_for_user(auth.user_id, per_page, offset)
        .await?;
    Ok(Json(NotificationListResponse {
        items,
        pagination: Pagination::from_query_and_total(&query, total),
    }))
}

/// POST /api/v1/notifications/{id}/read
#[utoipa::path(
    post,
    path = "/{id}/read",
    context_path = "/api/v1/notifications",
    tag = "notifications",
    operation_id = "mark_notification_read",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn mark_notification_read(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode> {
    state
        .notification_service()
        .mark_read(auth.user_id, id)
        .await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
