//! Error types for the generator core.

use opus_schema::SchemaError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type GenerateResult<T> = Result<T, GenerateError>;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unknown template kind: {0}")]
    UnknownKind(String),
    #[error("failed to read template {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("destination file already exists: {}", .0.display())]
    DestinationExists(PathBuf),
    /// A to-one lookup needs a primary key on the target table.
    #[error("table '{0}' has no primary key")]
    MissingPrimaryKey(String),
    #[error("invalid alias: {0}")]
    InvalidAlias(String),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("prompt failed: {0}")]
    Prompt(#[source] io::Error),
}

impl GenerateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GenerateError::Io {
            path: path.into(),
            source,
        }
    }
}
