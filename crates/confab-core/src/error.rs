//! Error taxonomy for the core.
//!
//! - `TransportError`: network/HTTP failure, surfaced verbatim (no retries)
//! - `SendError`: a send that failed before or during its request
//! - `ValidationError`: a rejected user intent (nothing was issued or echoed)
//!
//! Stale responses are not errors; the reducer drops them silently.

use std::fmt;

/// Categories of transport errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Non-2xx HTTP status.
    HttpStatus,
    /// Connection failure, timeout, or interrupted body.
    Network,
    /// Response body was not the expected JSON.
    Decode,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::HttpStatus => write!(f, "http_status"),
            TransportErrorKind::Network => write!(f, "network"),
            TransportErrorKind::Decode => write!(f, "decode"),
        }
    }
}

/// A failed request against the chat service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    /// Request path (e.g. `/history/s1`), never the full URL.
    pub path: String,
    /// HTTP status, when the server answered.
    pub status: Option<u16>,
    /// One-line summary suitable for display.
    pub message: String,
}

impl TransportError {
    /// Creates an HTTP status error, pulling `detail` out of a JSON body when present.
    pub fn http_status(path: impl Into<String>, status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| json.get("detail").and_then(|d| d.as_str()).map(str::to_string));
        let message = match detail {
            Some(detail) => format!("HTTP {status}: {detail}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind: TransportErrorKind::HttpStatus,
            path: path.into(),
            status: Some(status),
            message,
        }
    }

    pub fn network(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Network,
            path: path.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: TransportErrorKind::Decode,
            path: path.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.path)
    }
}

impl std::error::Error for TransportError {}

/// Why a send did not produce a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    Transport(TransportError),
    /// The pending file could not be read.
    Attachment { path: String, message: String },
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Transport(err) => write!(f, "Send failed: {err}"),
            SendError::Attachment { path, message } => {
                write!(f, "Failed to read attachment {path}: {message}")
            }
        }
    }
}

impl std::error::Error for SendError {}

impl From<TransportError> for SendError {
    fn from(err: TransportError) -> Self {
        SendError::Transport(err)
    }
}

/// A user intent the coordinator refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// No text and no file.
    EmptyMessage,
    /// Another send is still in flight.
    SendInFlight,
    /// The active session's history has not arrived yet.
    LoadInProgress,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyMessage => write!(f, "Nothing to send"),
            ValidationError::SendInFlight => write!(f, "A message is already being sent"),
            ValidationError::LoadInProgress => write!(f, "Session is still loading"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_extracts_detail() {
        let err = TransportError::http_status("/delete/x", 404, r#"{"detail":"Session not found"}"#);
        assert_eq!(err.message, "HTTP 404: Session not found");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "HTTP 404: Session not found (/delete/x)");
    }

    #[test]
    fn test_http_status_plain_body() {
        let err = TransportError::http_status("/chat", 502, "Bad Gateway");
        assert_eq!(err.message, "HTTP 502");
        assert_eq!(err.kind, TransportErrorKind::HttpStatus);
        assert!(!err.is_not_found());
    }
}
