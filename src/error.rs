// src/error.rs

use std::fmt;

/// Global client error enum.
/// Centralizes how backend failures, local storage failures and validation
/// problems are reported to the front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    // 401 Unauthorized: bad credentials, expired or invalid token
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 400 / 409 / 422 and local validation or business rule failures
    BadRequest(String),

    // Any other unsuccessful HTTP status (5xx mostly)
    Http { status: u16, message: String },

    Network(String),

    Timeout(String),

    // Undecodable response body
    Parse(String),

    // Persistent key-value store failures
    Storage(String),

    Config(String),
}

/// Coarse classification used by the front-end to pick a presentation:
/// a message, an inline "go back" panel, a blocking notice, or a retry prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    NotFound,
    Validation,
    Transient,
    Local,
}

impl AppError {
    /// Maps an unsuccessful HTTP status and its extracted message to an error.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => AppError::AuthError(message),
            403 => AppError::Forbidden(message),
            404 => AppError::NotFound(message),
            400 | 409 | 422 => AppError::BadRequest(message),
            _ => AppError::Http { status, message },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::AuthError(_) | AppError::Forbidden(_) => ErrorKind::Authentication,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::BadRequest(_) => ErrorKind::Validation,
            AppError::Http { .. }
            | AppError::Network(_)
            | AppError::Timeout(_)
            | AppError::Parse(_) => ErrorKind::Transient,
            AppError::Storage(_) | AppError::Config(_) => ErrorKind::Local,
        }
    }

    /// Whether re-issuing the same action by hand may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// The bare human-readable message, without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Network(msg)
            | AppError::Timeout(msg)
            | AppError::Parse(msg)
            | AppError::Storage(msg)
            | AppError::Config(msg) => msg,
            AppError::Http { message, .. } => message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::AuthError(msg) => write!(f, "Authentication failed: {msg}"),
            AppError::Forbidden(msg) => write!(f, "Not allowed: {msg}"),
            AppError::NotFound(msg) => write!(f, "Not found: {msg}"),
            AppError::BadRequest(msg) => write!(f, "{msg}"),
            AppError::Http { status, message } => {
                write!(f, "Request failed ({status}): {message}")
            }
            AppError::Network(msg) => write!(f, "Network error: {msg}"),
            AppError::Timeout(msg) => write!(f, "Timeout: {msg}"),
            AppError::Parse(msg) => write!(f, "Response error: {msg}"),
            AppError::Storage(msg) => write!(f, "Storage error: {msg}"),
            AppError::Config(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts transport errors, keeping timeouts distinguishable.
/// The raw reqwest message is preserved so it can be shown as-is.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout("Request timed out. Please try again.".to_string())
        } else if err.is_decode() {
            AppError::Parse(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
