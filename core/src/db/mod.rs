//! SQLite storage.
//!
//! This module provides:
//! - Connection pooling (r2d2-sqlite) with WAL and foreign keys on
//! - Schema migrations tracked through `PRAGMA user_version`
//! - Transaction and async helpers
//! - One repository module per entity under [`repo`]

pub mod async_wrapper;
pub mod connection;
pub mod migrations;
pub mod repo;
mod sql_types;
pub mod transactions;

pub use async_wrapper::with_connection;
pub use connection::{DbPool, initialize_pool, open_in_memory};
pub use migrations::{SCHEMA_VERSION, migrate_to_latest, schema_version};
pub use rusqlite::Connection;
pub use transactions::execute_in_transaction;

use crate::pm::ValidationError;

/// Database module result type
pub type Result<T> = std::result::Result<T, DbError>;

/// Database error types
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Conflict(String),
}

impl DbError {
    /// Foreign key, unique, check and not-null failures reported by SQLite.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            DbError::Sqlite(e) => {
                e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation)
            }
            DbError::Conflict(_) => true,
            _ => false,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Invalid(err.to_string())
    }
}
