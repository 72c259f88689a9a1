//! Crate-wide error type.
//!
//! Builder misuse (`UnsupportedOperation`, `UnknownRelatedType`,
//! `AttributeNotFound`) is reported here, while failures raised by the
//! connection are carried through unchanged in their own variants.

use crate::connection::ConnectionError;
use crate::value::ValueError;

/// Result alias used throughout the crate
pub type Result<T, E = QuarryError> = std::result::Result<T, E>;

/// Errors surfaced by relations, statements and connections
#[derive(Debug, thiserror::Error)]
pub enum QuarryError {
    /// The requested statement kind is not one of select/insert/update/delete,
    /// or a statement was used where its kind is not allowed.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// `includes` named a related entity that is not registered
    #[error("Unknown related type: {0}")]
    UnknownRelatedType(String),

    /// An ordinal accessor (or attribute) could not be resolved
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    /// A named placeholder in a raw fragment had no matching parameter
    #[error("Missing parameter `{0}` for raw fragment")]
    MissingParameter(String),

    /// Positional placeholders and supplied values differ in number
    #[error("Raw fragment has {placeholders} placeholder(s) but {values} value(s)")]
    ParameterCount { placeholders: usize, values: usize },

    /// A row value could not be converted into the requested Rust type
    #[error("Invalid value for column `{column}`: {source}")]
    Value {
        column: String,
        #[source]
        source: ValueError,
    },

    /// sea-query refused to build the statement
    #[error("Statement build error: {0}")]
    Build(#[from] sea_query::error::Error),

    /// `PostgreSQL` error from `may_postgres`
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] may_postgres::Error),

    /// Connection establishment failed
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// No connection was bound to the entity or established for the process
    #[error("No connection established; call `quarry::establish` first")]
    NoConnection,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl QuarryError {
    pub(crate) fn value(column: impl Into<String>, source: ValueError) -> Self {
        QuarryError::Value {
            column: column.into(),
            source,
        }
    }
}
