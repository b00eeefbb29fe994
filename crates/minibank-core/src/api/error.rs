use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Uniform error shape handed back to callers: a human-readable message plus
/// whatever additional fields the server put in its error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("{}", .payload.message)]
    Status { status: u16, payload: ErrorPayload },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode request: {0}")]
    Encode(String),

    #[error("No refresh token available")]
    MissingRefreshToken,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Build an error from a non-2xx response.
    ///
    /// JSON object bodies are kept verbatim as the payload fields; a missing
    /// `message` is filled from `error`, the raw body, or the status reason.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let payload = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(mut fields)) => {
                let message = match fields.remove("message") {
                    Some(Value::String(m)) => m,
                    Some(other) => other.to_string(),
                    None => fields
                        .get("error")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| Self::status_message(status)),
                };
                ErrorPayload { message, fields }
            }
            _ if body.trim().is_empty() => ErrorPayload::new(Self::status_message(status)),
            _ => ErrorPayload::new(Self::truncate_body(body.trim())),
        };

        ApiError::Status {
            status: status.as_u16(),
            payload,
        }
    }

    fn status_message(status: StatusCode) -> String {
        match status.canonical_reason() {
            Some(reason) => format!("Request failed with status {} {}", status.as_u16(), reason),
            None => format!("Request failed with status {}", status.as_u16()),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED.as_u16())
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(StatusCode::TOO_MANY_REQUESTS.as_u16())
    }

    /// The error in its uniform `{message, ...fields}` shape.
    pub fn payload(&self) -> ErrorPayload {
        match self {
            ApiError::Status { payload, .. } => payload.clone(),
            other => ErrorPayload::new(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
