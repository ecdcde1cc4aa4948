//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define typed CRUD contracts for batches, assets and comments.
//! - Isolate SQL details from workflow/service orchestration.
//! - Translate SQLite key violations into semantic errors.
//!
//! # Invariants
//! - Write paths validate input before touching storage.
//! - Every successful write has been flushed by `StorageEngine::write`.
//! - Parent rows are checked inside the same transaction as the insert.

use crate::db::DbError;
use crate::model::review::ValidationError;
use rusqlite::ffi;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod asset_repo;
pub mod batch_repo;
pub mod comment_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error taxonomy surfaced by every repository call.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    NotFound {
        entity: &'static str,
        id: String,
    },
    DuplicateKey {
        entity: &'static str,
        id: String,
    },
    /// Foreign-key target missing at creation time.
    Integrity {
        entity: &'static str,
        parent: &'static str,
        parent_id: String,
    },
    /// Storage or snapshot failure; `DbError::Io` means the flush failed.
    Db(DbError),
    InvalidData(String),
}

impl RepoError {
    /// Whether the error came from the durability flush.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Db(DbError::Io(_)))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::DuplicateKey { entity, id } => write!(f, "{entity} already exists: {id}"),
            Self::Integrity {
                entity,
                parent,
                parent_id,
            } => write!(f, "{entity} references missing {parent}: {parent_id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. }
            | Self::DuplicateKey { .. }
            | Self::Integrity { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(rusqlite::Error::FromSqlConversionFailure(column, _, source)) => {
                Self::InvalidData(format!("column {column}: {source}"))
            }
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::from(DbError::from(value))
    }
}

/// Maps a primary-key violation of an insert to `duplicate()`; everything
/// else passes through unchanged.
pub(crate) fn map_insert_error(
    err: impl Into<DbError>,
    duplicate: impl FnOnce() -> RepoError,
) -> RepoError {
    let err = err.into();
    if let DbError::Sqlite(rusqlite::Error::SqliteFailure(failure, _)) = &err {
        if matches!(
            failure.extended_code,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
        ) {
            return duplicate();
        }
    }
    RepoError::from(err)
}
