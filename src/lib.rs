//! Handover - Client Deliverable Portal Backend
//!
//! Admin users manage clients, projects and deliverables; client users
//! receive deliverables (links or files) for their projects. File payloads
//! live in an object store, metadata in PostgreSQL, and an integrity
//! scanner reconciles the two.

#[macro_use]
mod macros;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{AppError, Result};
