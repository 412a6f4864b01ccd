//! Error types for opus-schema

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Error type for schema introspection and snapshot handling.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Database error from tokio-postgres.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    /// The requested table is not part of the loaded schema.
    #[error("The database table '{0}' does not exist")]
    TableNotFound(String),
    /// An unqualified table name matched more than one configured schema.
    #[error("table name is ambiguous in configured schemas: {0}")]
    AmbiguousTable(String),
    /// Validation error (e.g., empty schema, malformed table reference).
    #[error("Validation error: {0}")]
    Validation(String),
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Decode error when reading a column.
    #[error("Decode error for column '{column}': {message}")]
    Decode { column: String, message: String },
    /// IO or other error.
    #[error("{0}")]
    Other(String),
}

impl SchemaError {
    /// Create a decode error.
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaError::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a table-not-found error.
    pub fn table_not_found(table: impl Into<String>) -> Self {
        SchemaError::TableNotFound(table.into())
    }
}
