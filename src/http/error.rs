use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;

/// What went wrong on the way to an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The server answered with a non-success status.
    Status,
    /// No answer: connection, timeout or body read failure.
    Transport,
    /// A success answer missing something the client needs.
    InvalidResponse,
}

/// Failure talking to the spot API.
///
/// Carried inside `anyhow::Error`; use [`ApiError::find`] to classify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ApiErrorKind,
    status: Option<StatusCode>,
    message: String,
}

impl ApiError {
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Status,
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::status(StatusCode::UNAUTHORIZED, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            status: None,
            message: message.into(),
        }
    }

    pub fn missing_credential() -> Self {
        Self::unauthorized("not signed in")
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: ApiErrorKind::InvalidResponse,
            status: None,
            message: message.into(),
        }
    }

    /// Builds the error for a non-success response, preferring the server's
    /// own wording from `detail`, `error` or `message`.
    pub fn from_response(status: StatusCode, body: &Value) -> Self {
        let message = server_message(body)
            .unwrap_or_else(|| format!("request failed: {}", status));
        Self::status(status, message)
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn find(err: &anyhow::Error) -> Option<&ApiError> {
        err.chain().find_map(|cause| cause.downcast_ref::<ApiError>())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({})", self.message, status.as_u16()),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::status(status, err.to_string()),
            None => Self::transport(err.to_string()),
        }
    }
}

fn server_message(body: &Value) -> Option<String> {
    ["detail", "error", "message"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
