//! Shared Data Transfer Objects (DTOs) for API handlers.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Pagination metadata for list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
    /// Total number of items across all pages
    pub total: i64,
    /// Total number of pages
    pub total_pages: u32,
}

impl Pagination {
    /// Create pagination from query parameters and total count.
    pub fn from_query_and_total(query: &PaginationQuery, total: i64) -> Self {
        let page = query.page();
        let per_page = query.per_page();
        let total_pages = if total == 0 {
            0
        } else {
            ((total as f64) / (per_page as f64)).ceil() as u32
        };

        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Query parameters for paginated list requests.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Requested page number (default: 1)
    pub page: Option<u32>,
    /// Requested items per page (default: 20)
    pub per_page: Option<u32>,
}

impl PaginationQuery {
    /// Get the page number, defaulting to 1 if not specified.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Get the per_page value, defaulting to 20 if not specified.
    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20)
    }
}

/// Request body addressing a set of deliverables.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkIdsRequest {
    pub ids: Vec<Uuid>,
}
