//! Riskbook - a local risk register for construction project teams.
//!
//! This library provides the core functionality for the `rb` CLI tool:
//! project and risk tracking, an audit trail, per-user notifications,
//! alert rules, and dashboard analytics, all persisted to a per-workspace
//! data directory.

pub mod alerts;
pub mod analytics;
pub mod cli;
pub mod commands;
pub mod models;
pub mod storage;


/// Library-level error type for Riskbook operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not initialized: run `rb system init` first")]
    NotInitialized,

    #[error("Not logged in: run `rb auth login` first")]
    NotAuthenticated,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Riskbook operations.
pub type Result<T> = std::result::Result<T, Error>;
