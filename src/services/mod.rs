//! Business logic services.

pub mod auth_service;
pub mod deliverable_service;
pub mod integrity_service;
pub mod notification_service;
pub mod project_service;
pub mod rate_limit;
pub mod validate;
