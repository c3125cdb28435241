//! Client error taxonomy.
//!
//! Every operation in the session, cart, catalog and admin layers returns a
//! [`ClientError`] so callers can pick the most specific string to show while
//! still branching on the category (validation vs. transport vs. backend).

use std::fmt;

use serde_json::Value;

/// Categories of client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// Rejected locally before any request was sent.
    Validation,
    /// Connection failure or other transport problem.
    Network,
    /// The request exceeded the configured timeout.
    Timeout,
    /// Non-success HTTP status other than 401.
    Backend,
    /// HTTP 401; the unauthorized signal has already been published.
    Unauthorized,
    /// Response body could not be decoded.
    Decode,
    /// Caller lacks the role required for the operation.
    AccessDenied,
    /// Token store read/write failure.
    Storage,
}

impl fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientErrorKind::Validation => "validation",
            ClientErrorKind::Network => "network",
            ClientErrorKind::Timeout => "timeout",
            ClientErrorKind::Backend => "backend",
            ClientErrorKind::Unauthorized => "unauthorized",
            ClientErrorKind::Decode => "decode",
            ClientErrorKind::AccessDenied => "access_denied",
            ClientErrorKind::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// Local validation failures. Each maps to the text shown next to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    PasswordMismatch,
    PasswordTooShort,
    InvalidQuantity,
    NotLoggedIn,
}

impl ValidationError {
    pub fn message(self) -> &'static str {
        match self {
            ValidationError::PasswordMismatch => "Пароли не совпадают",
            ValidationError::PasswordTooShort => "Пароль должен содержать минимум 6 символов",
            ValidationError::InvalidQuantity => "Количество должно быть не меньше 1",
            ValidationError::NotLoggedIn => {
                "Пожалуйста, войдите в систему чтобы добавить товар в корзину"
            }
        }
    }
}

/// Structured client error with kind and details.
#[derive(Debug, Clone)]
pub struct ClientError {
    /// Error category
    pub kind: ClientErrorKind,
    /// One-line summary suitable for logs
    pub message: String,
    /// HTTP status, when the error came from a response
    pub status: Option<u16>,
    /// Backend-reported `detail`, verbatim
    pub detail: Option<String>,
    /// Set for validation errors
    pub validation: Option<ValidationError>,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            detail: None,
            validation: None,
        }
    }

    pub fn validation(err: ValidationError) -> Self {
        Self {
            validation: Some(err),
            ..Self::new(ClientErrorKind::Validation, err.message())
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Timeout, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Decode, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Storage, message)
    }

    pub fn access_denied() -> Self {
        Self::new(ClientErrorKind::AccessDenied, "Доступ запрещен")
    }

    pub fn unauthorized(body: &str) -> Self {
        Self {
            status: Some(401),
            detail: extract_detail(body),
            ..Self::new(ClientErrorKind::Unauthorized, "HTTP 401")
        }
    }

    /// Creates an error from a non-success HTTP response.
    ///
    /// The backend reports failures as `{"detail": ...}`; the detail is kept
    /// verbatim so it can be shown to the user.
    pub fn http_status(status: u16, body: &str) -> Self {
        let detail = extract_detail(body);
        let message = match &detail {
            Some(detail) => format!("HTTP {status}: {detail}"),
            None => format!("HTTP {status}"),
        };
        Self {
            status: Some(status),
            detail,
            ..Self::new(ClientErrorKind::Backend, message)
        }
    }

    /// Maps a reqwest transport error onto the taxonomy.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::decode(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }

    /// Network errors and timeouts may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ClientErrorKind::Network | ClientErrorKind::Timeout
        )
    }

    /// The most specific string available for display.
    pub fn user_message(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.message)
    }

    /// Like [`Self::user_message`], but failures without a backend detail
    /// collapse to `fallback` instead of leaking transport error text.
    pub fn user_message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if let Some(detail) = self.detail.as_deref() {
            return detail;
        }
        match self.kind {
            ClientErrorKind::Validation | ClientErrorKind::AccessDenied => &self.message,
            _ => fallback,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ClientError {}

/// Pulls a displayable `detail` out of an error body.
///
/// `detail` is usually a string; validation failures arrive as a list of
/// objects carrying `msg`, which are joined.
fn extract_detail(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match json.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::String(_) => None,
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_keeps_string_detail() {
        let err = ClientError::http_status(400, r#"{"detail":"Not enough stock"}"#);
        assert_eq!(err.kind, ClientErrorKind::Backend);
        assert_eq!(err.status, Some(400));
        assert_eq!(err.user_message(), "Not enough stock");
        assert_eq!(err.message, "HTTP 400: Not enough stock");
    }

    #[test]
    fn test_http_status_joins_validation_messages() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"invalid email"},{"msg":"too short"}]}"#;
        let err = ClientError::http_status(422, body);
        assert_eq!(err.detail.as_deref(), Some("invalid email; too short"));
    }

    #[test]
    fn test_http_status_without_json_body() {
        let err = ClientError::http_status(502, "<html>bad gateway</html>");
        assert!(err.detail.is_none());
        assert_eq!(err.user_message(), "HTTP 502");
        assert_eq!(err.user_message_or("fallback"), "fallback");
    }

    #[test]
    fn test_blank_detail_falls_back() {
        for body in [r#"{"detail":""}"#, r#"{"detail":"   "}"#] {
            let err = ClientError::http_status(400, body);
            assert!(err.detail.is_none());
            assert_eq!(err.message, "HTTP 400");
            assert_eq!(err.user_message_or("fallback"), "fallback");
        }
        assert!(ClientError::unauthorized(r#"{"detail":""}"#).detail.is_none());
    }

    #[test]
    fn test_validation_error_message() {
        let err = ClientError::validation(ValidationError::PasswordMismatch);
        assert_eq!(err.kind, ClientErrorKind::Validation);
        assert_eq!(err.validation, Some(ValidationError::PasswordMismatch));
        assert_eq!(err.user_message_or("fallback"), "Пароли не совпадают");
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ClientError::timeout("slow").is_retryable());
        assert!(ClientError::network("refused").is_retryable());
        assert!(!ClientError::http_status(500, "").is_retryable());
        assert!(!ClientError::unauthorized("").is_retryable());
    }
}
