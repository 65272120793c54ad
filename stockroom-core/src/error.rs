// Error types for the Stockroom service

use crate::HttpStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid required input.
    #[error("{0}")]
    Validation(String),

    /// Unknown id, or a photo that is absent or missing on disk.
    #[error("{0}")]
    NotFound(String),

    /// No route pattern matched the path. The display string is the exact
    /// wire message; the field carries the offending path for logging.
    #[error("Not Found")]
    RouteNotFound(String),

    /// A pattern matched the path but has no handler for the method.
    #[error("Method Not Allowed")]
    MethodNotAllowed(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Failure in an upstream collaborator (form decoder, filesystem).
    #[error("{0}")]
    Upstream(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => HttpStatus::BadRequest.code(),
            Error::Deserialization(_) => HttpStatus::BadRequest.code(),
            Error::NotFound(_) => HttpStatus::NotFound.code(),
            Error::RouteNotFound(_) => HttpStatus::NotFound.code(),
            Error::MethodNotAllowed(_) => HttpStatus::MethodNotAllowed.code(),
            Error::Upstream(_) | Error::Io(_) | Error::Internal(_) => {
                HttpStatus::InternalServerError.code()
            }
        }
    }

    /// Get the HttpStatus enum for this error
    pub fn http_status(&self) -> HttpStatus {
        HttpStatus::from_code(self.status_code()).unwrap_or(HttpStatus::InternalServerError)
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.http_status().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_server_error()
    }
}

impl From<stockroom_storage::StorageError> for Error {
    fn from(err: stockroom_storage::StorageError) -> Self {
        use stockroom_storage::StorageError;
        match err {
            // The raw file path never reaches a client; the storage layer
            // already logged the detail.
            StorageError::NotFound(_) => Error::NotFound("photo not found".to_string()),
            StorageError::Multipart(msg) => Error::Upstream(format!("form decode failed: {msg}")),
            StorageError::Storage(msg) => Error::Upstream(msg),
            StorageError::Io(e) => Error::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::Validation("x".into()).status_code(), 400);
        assert_eq!(Error::NotFound("x".into()).status_code(), 404);
        assert_eq!(Error::RouteNotFound("/x".into()).status_code(), 404);
        assert_eq!(Error::MethodNotAllowed("PATCH /x".into()).status_code(), 405);
        assert_eq!(Error::Upstream("x".into()).status_code(), 500);
        assert_eq!(Error::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_wire_messages_for_dispatch_errors() {
        assert_eq!(Error::RouteNotFound("/x".into()).to_string(), "Not Found");
        assert_eq!(
            Error::MethodNotAllowed("PATCH /x".into()).to_string(),
            "Method Not Allowed"
        );
    }

    #[test]
    fn test_storage_not_found_hides_path() {
        let err = Error::from(stockroom_storage::StorageError::NotFound(
            "/var/cache/abc-1".to_string(),
        ));
        assert_eq!(err.status_code(), 404);
        assert!(!err.to_string().contains("/var/cache"));
    }
}
