//! API handlers.

pub mod auth;
pub mod deliverables;
pub mod health;
pub mod integrity;
pub mod notifications;
pub mod projects;
