use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No response was received (connection refused, DNS, TLS...).
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status code.
        status: u16,
        /// Message taken from the response body, or the reason phrase.
        message: String,
    },

    /// The server answered but the payload is not what we expected.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Persisted state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Build an HTTP error from a status and the raw response body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        ClientError::Http {
            status: status.as_u16(),
            message: extract_message(status, body),
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the credentials.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    /// Whether no response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Timeout)
    }

    /// Message supplied by the server body, when there was one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Http { status, message } => {
                let reason = StatusCode::from_u16(*status)
                    .ok()
                    .and_then(|s| s.canonical_reason());
                if message.is_empty() || Some(message.as_str()) == reason {
                    None
                } else {
                    Some(message)
                }
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_decode() {
            ClientError::MalformedResponse(e.to_string())
        } else if e.is_builder() {
            ClientError::InvalidRequest(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

/// Pull a human readable message out of an error body.
///
/// Accepts `{"message": "..."}` JSON, `{"error": "..."}` JSON or plain text,
/// falling back to the status reason phrase.
fn extract_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let field = value
            .get("message")
            .and_then(serde_json::Value::as_str)
            .or_else(|| value.get("error").and_then(serde_json::Value::as_str));
        if let Some(message) = field {
            return message.to_string();
        }
        if let Some(text) = value.as_str() {
            return text.to_string();
        }
    } else if !body.is_empty() {
        return body.to_string();
    }

    status.canonical_reason().unwrap_or("Unknown error").to_string()
}

/// Result type alias for the client.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_from_json_body() {
        let err = ClientError::from_status(StatusCode::BAD_REQUEST, r#"{"message":"ISBN taken"}"#);
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.server_message(), Some("ISBN taken"));
    }

    #[test]
    fn null_message_falls_back_to_error_field() {
        let err = ClientError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":null,"error":"Title is required"}"#,
        );
        assert_eq!(err.server_message(), Some("Title is required"));
    }

    #[test]
    fn message_from_plain_text_body() {
        let err = ClientError::from_status(StatusCode::UNAUTHORIZED, "bad credentials");
        assert!(err.is_unauthorized());
        assert_eq!(err.server_message(), Some("bad credentials"));
    }

    #[test]
    fn empty_body_falls_back_to_reason() {
        let err = ClientError::from_status(StatusCode::NOT_FOUND, "");
        assert_eq!(err.to_string(), "HTTP 404: Not Found");
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn transport_errors_have_no_status() {
        assert!(ClientError::Timeout.is_transport());
        assert_eq!(ClientError::Network("refused".into()).status(), None);
    }
}
