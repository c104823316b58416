//! Route definitions for the API.

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers;
use super::middleware::auth::auth_middleware;
use super::SharedState;
use crate::services::auth_service::AuthService;

/// Create the main API router
pub fn create_router(state: SharedState) -> Router {
    // Build OpenAPI spec once at startup
    let openapi = super::openapi::build_openapi();

    let auth_service = Arc::new(AuthService::new(state.db.clone(), &state.config));

    // Everything except health and login requires a valid bearer token.
    let protected = Router::new()
        .nest("/api/v1/projects", handlers::projects::router())
        .nest("/api/v1/deliverables", handlers::deliverables::router())
        .nest("/api/v1/notifications", handlers::notifications::router())
        .nest("/api/v1/admin/integrity-scan", handlers::integrity::router())
        .layer(middleware::from_fn_with_state(
            auth_service,
            auth_middleware,
        ));

    Router::new()
        // Health endpoints (no auth required)
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .nest("/api/v1/auth", handlers::auth::router())
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .with_state(state)
}
