//! Integrity scan API handler.

use axum::{extract::Extension, extract::State, routing::post, Json, Router};
use utoipa::OpenApi;

use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::services::integrity_service::{
    BrokenDeliverable, BrokenReason, IntegrityReport, ScanOptions,
};

#[derive(OpenApi)]
#[openapi(
    paths(run_integrity_scan),
    components(schemas(ScanOptions, IntegrityReport, BrokenDeliverable, BrokenReason))
)]
pub struct IntegrityApiDoc;

pub fn router() -> Router<SharedState> {
    Router::new().route("/", post(run_integrity_scan))
}

/// POST /api/v1/admin/integrity-scan
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/admin/integrity-scan",
    tag = "admin",
    operation_id = "run_integrity_scan",
    request_body = ScanOptions,
    responses(
        (status = 200, description = "Scan report", body = IntegrityReport),
        (status = 403, description = "Admin privileges required"),
    ),
    security(("bearer_auth" = [])),
)]
pub async fn run_integrity_scan(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(payload): Json<ScanOptions>,
) -> Result<Json<IntegrityReport>> {
    if !auth.is_admin {
        return Err(AppError::Permission("Admin privileges required".to_string()));
    }

    let report = state.integrity_service().scan(payload).await?;
    Ok(Json(report))
}
