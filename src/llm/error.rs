//! Error types for inference clients.

use std::fmt;

/// Category of an inference failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// No credential configured; detected before any request is sent.
    Configuration,
    /// Transport failure, non-2xx status, or an unreadable response envelope.
    RemoteUnavailable,
}

impl fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration error"),
            Self::RemoteUnavailable => write!(f, "remote unavailable"),
        }
    }
}

/// Error returned by an [`InferenceClient`](super::InferenceClient).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
    /// HTTP status code when the endpoint answered with a non-success status.
    pub status: Option<u16>,
}

impl LlmError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::Configuration,
            message: message.into(),
            status: None,
        }
    }

    pub fn network_error(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::RemoteUnavailable,
            message: message.into(),
            status: None,
        }
    }

    /// The endpoint answered, but not with a 2xx status.
    pub fn http_status(status: u16, body: &str) -> Self {
        Self {
            kind: LlmErrorKind::RemoteUnavailable,
            message: format!("HTTP {}: {}", status, truncate_body(body)),
            status: Some(status),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            kind: LlmErrorKind::RemoteUnavailable,
            message: message.into(),
            status: None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind == LlmErrorKind::Configuration
    }
}

/// Error bodies can be whole HTML pages; keep log lines readable.
fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
