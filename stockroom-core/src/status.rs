// HTTP status codes

/// Status codes the service emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    // 2xx Success
    Ok = 200,
    Created = 201,

    // 4xx Client Errors
    BadRequest = 400,
    NotFound = 404,
    MethodNotAllowed = 405,

    // 5xx Server Errors
    InternalServerError = 500,
}

impl HttpStatus {
    /// Get the numeric status code
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the reason phrase for the status code
    pub fn reason(&self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",
            HttpStatus::Created => "Created",
            HttpStatus::BadRequest => "Bad Request",
            HttpStatus::NotFound => "Not Found",
            HttpStatus::MethodNotAllowed => "Method Not Allowed",
            HttpStatus::InternalServerError => "Internal Server Error",
        }
    }

    /// Look up a status from its numeric code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            200 => Some(HttpStatus::Ok),
            201 => Some(HttpStatus::Created),
            400 => Some(HttpStatus::BadRequest),
            404 => Some(HttpStatus::NotFound),
            405 => Some(HttpStatus::MethodNotAllowed),
            500 => Some(HttpStatus::InternalServerError),
            _ => None,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.code())
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.code() >= 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_reason() {
        assert_eq!(HttpStatus::Ok.code(), 200);
        assert_eq!(HttpStatus::MethodNotAllowed.code(), 405);
        assert_eq!(HttpStatus::MethodNotAllowed.reason(), "Method Not Allowed");
        assert_eq!(HttpStatus::NotFound.reason(), "Not Found");
    }

    #[test]
    fn test_from_code_roundtrip() {
        for status in [
            HttpStatus::Ok,
            HttpStatus::Created,
            HttpStatus::BadRequest,
            HttpStatus::NotFound,
            HttpStatus::MethodNotAllowed,
            HttpStatus::InternalServerError,
        ] {
            assert_eq!(HttpStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(HttpStatus::from_code(418), None);
    }

    #[test]
    fn test_error_classes() {
        assert!(HttpStatus::BadRequest.is_client_error());
        assert!(!HttpStatus::BadRequest.is_server_error());
        assert!(HttpStatus::InternalServerError.is_server_error());
        assert!(!HttpStatus::Ok.is_client_error());
    }
}
