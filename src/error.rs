use std::collections::HashMap;

use reqwest::StatusCode;

/// Client-side error taxonomy for the banking API.
///
/// Validation errors never reach the network; everything else wraps a
/// backend response or a transport/storage failure.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Pre-dispatch validation failure, with per-field messages where known.
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    /// Backend rejected the request (non-2xx other than 401/403).
    /// Carries the backend-provided message when present.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    /// 401/403 from the backend. The session has already been cleared
    /// as a side effect by the time this surfaces.
    #[error("authorization failed: {message}")]
    Unauthorized { status: StatusCode, message: String },

    /// A de-duplicated fetch led by another caller failed; all waiters
    /// observe the same failure message.
    #[error("{0}")]
    Fetch(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("not logged in")]
    NotLoggedIn,
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation {
            message: message.into(),
            field_errors: HashMap::new(),
        }
    }

    /// Validation failure attached to a single offending field.
    pub fn field_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.into(), message.clone());
        ClientError::Validation {
            message,
            field_errors,
        }
    }

    /// Field-level errors for validation failures, `None` otherwise.
    pub fn field_errors(&self) -> Option<&HashMap<String, String>> {
        match self {
            ClientError::Validation { field_errors, .. } => Some(field_errors),
            _ => None,
        }
    }
}
