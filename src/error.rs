// src/error.rs
//! Error taxonomy for the engine (spec §7).

use thiserror::Error;

/// All error kinds the engine can raise.
///
/// The matcher and update executor treat most shape mismatches as "predicate
/// false" / "no-op" rather than raising; only explicit contract violations
/// produce a `DbError`. Index violations raise at the write that caused them
/// and leave the Collection unchanged.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("duplicate key for index '{index}': {key}")]
    DuplicateKey { index: String, key: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("operation cancelled")]
    ConflictCancelled,

    #[error("backend error: {0}")]
    BackendError(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("collection '{0}' not found")]
    CollectionNotFound(String),

    #[error("document not found")]
    DocumentNotFound,

    #[error("index error: {0}")]
    IndexError(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::Serialization(e.to_string())
    }
}
