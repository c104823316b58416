//! Authentication middleware.
//!
//! Extracts and validates `Authorization: Bearer <jwt>` tokens.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::models::user::Requester;
use crate::services::auth_service::{AuthService, Claims};

/// Extension that holds authenticated user information
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<Claims> for AuthExtension {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            email: claims.email,
            is_admin: claims.is_admin,
        }
    }
}

impl AuthExtension {
    /// The identity passed into core service operations.
    pub fn requester(&self) -> Requester {
        Requester {
            user_id: self.user_id,
            is_admin: self.is_admin,
        }
    }
}

/// Extract a bearer token from the Authorization header.
fn extract_bearer(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Authentication middleware - requires a valid bearer token.
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(&request) else {
        return unauthorized("Missing bearer token");
    };

    match auth_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthExtension::from(claims));
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!("Token validation failed: {}", e);
            unauthorized("Invalid or expired token")
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "code": "AUTH_ERROR",
            "message": message,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use chrono::Utc;

    #[test]
    fn test_extract_bearer() {
        let request = Request::builder()
            .header(AUTHORIZATION, "Bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer(&request), Some("abc.def.ghi"));
    }

    #[test]
    fn test_extract_bearer_missing_header() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_bearer(&request), None);
    }

    #[test]
    fn test_extract_bearer_wrong_scheme() {
        let request = Request::builder()
            .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_bearer(&request), None);
    }

    #[test]
    fn test_auth_extension_from_claims() {
        let id = Uuid::new_v4();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: id,
            username: "acme".into(),
            email: "client@acme.example".into(),
            is_admin: false,
            iat: now,
            exp: now + 3600,
        };
        let ext = AuthExtension::from(claims);
        assert_eq!(ext.user_id, id);
        assert!(!ext.is_admin);

        let requester = ext.requester();
        assert_eq!(requester.user_id, id);
        assert!(!requester.is_admin);
    }
}
