//! Storage faults raised by [`crate::db::Database`] operations.
//!
//! A missing record is not an error: lookups return `Option` and deletes
//! return `bool`. Everything here is a write the storage layer refused, or a
//! failure of the engine itself.

use rusqlite::ffi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Category {0} not found")]
    UnknownCategory(i64),

    #[error("Category name '{0}' is already taken")]
    DuplicateCategory(String),

    #[error("Category {id} is still used by {projects} project(s)")]
    CategoryInUse { id: i64, projects: i64 },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),
}

impl StorageError {
    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Sqlite(_))
    }
}

impl From<rusqlite::Error> for StorageError {
    /// Constraint failures become [`StorageError::Constraint`]; the rest pass through.
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let detail = msg
                    .clone()
                    .unwrap_or_else(|| constraint_kind(e.extended_code).to_string());
                Self::Constraint(detail)
            }
            _ => Self::Sqlite(err),
        }
    }
}

fn constraint_kind(extended_code: i32) -> &'static str {
    match extended_code {
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => "foreign key",
        ffi::SQLITE_CONSTRAINT_UNIQUE => "unique",
        ffi::SQLITE_CONSTRAINT_CHECK => "check",
        ffi::SQLITE_CONSTRAINT_NOTNULL => "not null",
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY => "primary key",
        _ => "constraint",
    }
}

/// True if `err` is a UNIQUE violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
