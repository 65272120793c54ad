//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage and upload errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Multipart parsing error.
    #[error("Multipart error: {0}")]
    Multipart(String),

    /// File not found.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Convert to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            _ => 500,
        }
    }
}

impl From<multer::Error> for StorageError {
    fn from(err: multer::Error) -> Self {
        Self::Multipart(err.to_string())
    }
}
