//! Error types for the dopo domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; crates further out wrap
//! these with `#[from]`.

use thiserror::Error;

// --- Bounded context errors ---

/// Errors raised while evaluating filter specifications.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid filter '{name}': {reason}")]
    InvalidFilter { name: String, reason: String },

    #[error("activity {activity} has no field '{field}'")]
    FieldAccess { field: String, activity: String },
}

/// Failures reported by (or about) the external LCA engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("computation failed for {activity} with {method}: {reason}")]
    Computation {
        activity: String,
        method: String,
        reason: String,
    },

    #[error("Project not found: {0}")]
    UnknownProject(String),

    #[error("Database not found: {database} (project: {project})")]
    UnknownDatabase { project: String, database: String },

    #[error("Method not available: {0}")]
    UnknownMethod(String),

    #[error("No database selected in context for project {0}")]
    NoDatabase(String),

    #[error("Inventory storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("Failed to encode workbook: {0}")]
    Encode(String),

    #[error("Workbook has no sheets")]
    EmptyWorkbook,
}
