// Client Error Types
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when the server did not supply one
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Field-level validation error as reported in the response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every failure a caller of the client can observe
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    // 401, missing/expired/invalid credential or failed refresh
    #[error("{message}")]
    Unauthenticated { message: String },

    // 4xx with (optional) field errors
    #[error("{message}")]
    Validation {
        status: u16,
        message: String,
        field_errors: Vec<FieldError>,
    },

    // 403
    #[error("{message}")]
    Forbidden { message: String },

    // 404
    #[error("{message}")]
    NotFound { message: String },

    // 5xx
    #[error("{message}")]
    Server { status: u16, message: String },

    // No response received (connection refused, timeout, ...)
    #[error("Network error: {message}")]
    Network { message: String, timed_out: bool },

    // Response arrived but did not match the envelope contract
    #[error("Malformed response: {0}")]
    Decode(String),

    // Credential persistence failed
    #[error("Credential storage error: {0}")]
    Credentials(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification used by callers that branch on the failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    Unauthenticated,
    Validation,
    Forbidden,
    NotFound,
    ServerError,
    NetworkFailure,
    Decode,
    Credentials,
    Config,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            ClientError::Validation { .. } => ErrorKind::Validation,
            ClientError::Forbidden { .. } => ErrorKind::Forbidden,
            ClientError::NotFound { .. } => ErrorKind::NotFound,
            ClientError::Server { .. } => ErrorKind::ServerError,
            ClientError::Network { .. } => ErrorKind::NetworkFailure,
            ClientError::Decode(_) => ErrorKind::Decode,
            ClientError::Credentials(_) => ErrorKind::Credentials,
            ClientError::Config(_) => ErrorKind::Config,
        }
    }

    /// HTTP status that produced the error, if one was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Unauthenticated { .. } => Some(401),
            ClientError::Validation { status, .. } => Some(*status),
            ClientError::Forbidden { .. } => Some(403),
            ClientError::NotFound { .. } => Some(404),
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::NetworkFailure => "NETWORK_FAILURE",
            ErrorKind::Decode => "DECODE_ERROR",
            ErrorKind::Credentials => "CREDENTIALS_ERROR",
            ErrorKind::Config => "CONFIG_ERROR",
        }
    }

    /// Human readable message for display: the server's envelope message when
    /// present, otherwise a generic fallback
    pub fn user_message(&self) -> String {
        let message = match self {
            ClientError::Unauthenticated { message }
            | ClientError::Validation { message, .. }
            | ClientError::Forbidden { message }
            | ClientError::NotFound { message }
            | ClientError::Server { message, .. } => message.as_str(),
            ClientError::Network { .. } => "Unable to reach the server. Check your connection.",
            _ => "",
        };

        if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message.to_string()
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ClientError::Validation { field_errors, .. } => field_errors,
            _ => &[],
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ClientError::Unauthenticated { .. })
    }
}

// Static constructor methods
impl ClientError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ClientError::Unauthenticated {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        ClientError::Validation {
            status: 400,
            message: message.into(),
            field_errors,
        }
    }

    /// Client-side validation failure for a single field
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        ClientError::validation(
            message.clone(),
            vec![FieldError {
                field: field.to_string(),
                message,
            }],
        )
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ClientError::Decode(message.into())
    }

    pub fn credentials(message: impl Into<String>) -> Self {
        ClientError::Credentials(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        ClientError::Config(message.into())
    }

    /// Classify a non-success HTTP status together with the envelope fields
    /// the server sent back
    pub fn from_status(status: u16, message: Option<String>, field_errors: Vec<FieldError>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_message(status).to_string());

        match status {
            401 => ClientError::Unauthenticated { message },
            403 => ClientError::Forbidden { message },
            404 => ClientError::NotFound { message },
            400..=499 => ClientError::Validation {
                status,
                message,
                field_errors,
            },
            _ => ClientError::Server { status, message },
        }
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        401 => "Authentication required",
        403 => "Forbidden",
        404 => "Not found",
        400..=499 => "Request was rejected",
        _ => "Server error",
    }
}

/// `Network` is reserved for requests that never got a response
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ClientError::Config(err.to_string())
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network {
                timed_out: err.is_timeout(),
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Config(format!("invalid URL: {}", err))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ClientError::from_status(401, None, vec![]).kind(), ErrorKind::Unauthenticated);
        assert_eq!(ClientError::from_status(403, None, vec![]).kind(), ErrorKind::Forbidden);
        assert_eq!(ClientError::from_status(404, None, vec![]).kind(), ErrorKind::NotFound);
        assert_eq!(ClientError::from_status(409, None, vec![]).kind(), ErrorKind::Validation);
        assert_eq!(ClientError::from_status(422, None, vec![]).kind(), ErrorKind::Validation);
        assert_eq!(ClientError::from_status(503, None, vec![]).kind(), ErrorKind::ServerError);
    }

    #[test]
    fn test_user_message_prefers_server_message() {
        let err = ClientError::from_status(400, Some("Cannot delete default category".into()), vec![]);
        assert_eq!(err.user_message(), "Cannot delete default category");
        assert_eq!(err.status_code(), Some(400));
    }

    #[test]
    fn test_user_message_falls_back_to_generic() {
        let err = ClientError::Server {
            status: 500,
            message: "  ".into(),
        };
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(ClientError::decode("bad").user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_request_builder_failure_is_not_a_network_error() {
        let err = reqwest::Client::new()
            .get("http://[::1")
            .build()
            .unwrap_err();
        assert!(err.is_builder());
        assert!(matches!(ClientError::from(err), ClientError::Config(_)));
    }

    #[test]
    fn test_invalid_field_carries_field_error() {
        let err = ClientError::invalid_field("amount", "Amount must be positive");
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].field, "amount");
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
