//! Download response mapping.
//!
//! Turns a resolved [`DownloadTarget`] into an HTTP response:
//! - 302 redirect to the deliverable's external URL (url kind)
//! - 302 redirect to a time-limited presigned URL (file kind, S3)
//! - streamed content (file kind, backends without presigning)

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::services::deliverable_service::DownloadTarget;

/// Header indicating how the deliverable was served
pub const X_DELIVERABLE_SOURCE: &str = "x-deliverable-source";

impl IntoResponse for DownloadTarget {
    fn into_response(self) -> Response {
        match self {
            DownloadTarget::ExternalUrl(url) => Response::builder()
                .status(StatusCode::FOUND)
                .header(LOCATION, url)
                .header(X_DELIVERABLE_SOURCE, "redirect-url")
                .body(Body::empty())
                .unwrap(),
            DownloadTarget::Presigned(presigned) => Response::builder()
                .status(StatusCode::FOUND)
                .header(LOCATION, presigned.url)
                .header(X_DELIVERABLE_SOURCE, "redirect-presigned")
                .header(
                    CACHE_CONTROL,
                    format!("private, max-age={}", presigned.expires_in.as_secs()),
                )
                .body(Body::empty())
                .unwrap(),
            DownloadTarget::Content {
                data,
                content_type,
                filename,
            } => Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, content_type)
                .header(CONTENT_LENGTH, data.len())
                .header(X_DELIVERABLE_SOURCE, "proxy")
                .header(
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", filename),
                )
                .body(Body::from(data))
                .unwrap(),
        }
    }
}
