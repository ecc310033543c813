//! Service Layer Error Types
//!
//! High-level error types for all service operations, with enough shape
//! for the HTTP layer to map them onto status codes (validation vs cycle
//! vs not-found vs conflict).

use crate::db::DatabaseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Entity not found by id (or soft-deleted where the operation
    /// requires a live row)
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Input rejected before any mutation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Reorder would make a node its own ancestor
    #[error("Cannot move node {node_id} under its own descendant {target_parent_id}")]
    Cycle { node_id: i64, target_parent_id: i64 },

    /// Unique constraint or concurrent-modification conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A multi-statement transaction failed and was rolled back
    #[error("Transaction failed: {context}")]
    Transaction { context: String },

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    /// Create a not-found error
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a cycle error
    pub fn cycle(node_id: i64, target_parent_id: i64) -> Self {
        Self::Cycle {
            node_id,
            target_parent_id,
        }
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a transaction failed error
    pub fn transaction(context: impl Into<String>) -> Self {
        Self::Transaction {
            context: context.into(),
        }
    }

    /// Wrap a raw libsql error with query context.
    ///
    /// Unique-constraint violations are surfaced as `Conflict` so callers
    /// can distinguish them from infrastructure failures.
    pub fn from_sql(context: &str, e: libsql::Error) -> Self {
        let message = e.to_string();
        if message.contains("UNIQUE constraint failed") {
            return Self::Conflict(message);
        }
        Self::Database(DatabaseError::sql_execution(format!(
            "{}: {}",
            context, message
        )))
    }
}
