use thiserror::Error;

/// Main error type for device server operations
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid client or signer configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Failed to mint the authorization token for a request
    #[error("failed to sign authorization token: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<jsonwebtoken::errors::Error>,
    },

    /// Network level failure (DNS, connection, TLS, timeout)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a failing status code
    #[error("http status {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    /// Request body could not be serialized
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Response body was not the expected JSON
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Relation absent from a document, for lookups where absence is tolerable
    #[error("link not found: {rel}")]
    LinkNotFound { rel: String },

    /// Relation required to locate an operation is absent
    #[error("missing required relation: {rel}")]
    MissingRelation { rel: String },

    /// Caller supplied input rejected before any request was made
    #[error("validation error: {0}")]
    Validation(String),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl ClientError {
    /// Create a new HTTP status error
    pub fn http_status(status: u16, reason: impl Into<String>) -> Self {
        ClientError::HttpStatus {
            status,
            reason: reason.into(),
        }
    }

    /// Create a new token signing error
    pub fn auth(message: impl Into<String>, source: Option<jsonwebtoken::errors::Error>) -> Self {
        ClientError::Auth {
            message: message.into(),
            source,
        }
    }

    /// Get the HTTP status code if this is a status error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the server answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::HttpStatus { status: 404, .. })
    }

    /// Check if a required hypermedia relation was absent
    pub fn is_missing_relation(&self) -> bool {
        matches!(self, ClientError::MissingRelation { .. })
    }

    /// Check if the input was rejected before any request was made
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }
}

/// Result type for device server operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_code() {
        let error = ClientError::http_status(503, "Service Unavailable");
        assert_eq!(error.status_code(), Some(503));
        assert!(!error.is_not_found());
        assert_eq!(error.to_string(), "http status 503: Service Unavailable");
    }

    #[test]
    fn test_error_not_found() {
        let error = ClientError::http_status(404, "Not Found");
        assert!(error.is_not_found());
    }

    #[test]
    fn test_error_relation_kinds() {
        let missing = ClientError::MissingRelation {
            rel: "accesskeys".to_string(),
        };
        let not_found = ClientError::LinkNotFound {
            rel: "self".to_string(),
        };

        assert!(missing.is_missing_relation());
        assert!(!not_found.is_missing_relation());
        assert_eq!(missing.status_code(), None);
    }

    #[test]
    fn test_encode_and_decode_are_distinct() {
        let json_err = || serde_json::from_str::<u8>("x").unwrap_err();

        let encode = ClientError::Encode(json_err());
        let decode = ClientError::from(json_err());
        assert!(encode.to_string().starts_with("failed to encode request body"));
        assert!(matches!(decode, ClientError::Decode(_)));

        let auth = ClientError::auth("token expiry out of range", None);
        assert_eq!(auth.to_string(), "failed to sign authorization token: token expiry out of range");
    }
}
