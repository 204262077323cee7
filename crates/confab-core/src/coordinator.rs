//! Send coordinator: turns a user send into exactly one request.
//!
//! States: `Idle -> Sending -> Idle`. The outcome of the last send is kept in
//! `last_error` (`None` after success). Sends are serialized: while one is
//! in flight, further sends are rejected, not queued.

use std::path::{Path, PathBuf};

use crate::buffer::Selection;
use crate::error::ValidationError;
use crate::task::TaskId;
use crate::types::ChatMessage;

/// Question used when a file is sent without text.
pub const DEFAULT_QUESTION: &str = "Explain this file";

/// A file attached to the draft, read only when the send is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub path: PathBuf,
    pub name: String,
}

impl PendingFile {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        Self { path, name }
    }
}

/// Pending text and at most one pending file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DraftInput {
    pub text: String,
    pub file: Option<PendingFile>,
}

impl DraftInput {
    pub fn clear(&mut self) {
        self.text.clear();
        self.file = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    Sending {
        task: TaskId,
        /// Selection at send time; the reply is applied only if it still matches.
        target: Selection,
    },
}

/// The request a send turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutgoingRequest {
    /// `POST /chat` with `{message, session_id}`.
    Chat {
        message: String,
        session_id: Option<String>,
    },
    /// `POST /upload` with `file`, `question` and optional `session_id`.
    Upload {
        file: PendingFile,
        question: String,
        session_id: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct SendCoordinator {
    pub state: SendState,
    /// Failure of the last send, for the shell to report.
    pub last_error: Option<String>,
    pub default_question: String,
}

impl Default for SendCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_QUESTION)
    }
}

impl SendCoordinator {
    pub fn new(default_question: impl Into<String>) -> Self {
        Self {
            state: SendState::Idle,
            last_error: None,
            default_question: default_question.into(),
        }
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.state, SendState::Sending { .. })
    }

    /// Checks whether a send may start.
    ///
    /// # Errors
    /// `SendInFlight` while sending, `EmptyMessage` with no text and no file.
    pub fn validate(&self, text: &str, file: Option<&PendingFile>) -> Result<(), ValidationError> {
        if self.is_sending() {
            return Err(ValidationError::SendInFlight);
        }
        if text.trim().is_empty() && file.is_none() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(())
    }

    fn question_for(&self, text: &str) -> String {
        if text.trim().is_empty() {
            self.default_question.clone()
        } else {
            text.to_string()
        }
    }

    /// The user-visible echo of a send.
    pub fn echo_message(&self, text: &str, file: Option<&PendingFile>) -> ChatMessage {
        match file {
            Some(file) => ChatMessage::user(format!(
                "[Attached: {}] {}",
                file.name,
                self.question_for(text)
            )),
            None => ChatMessage::user(text),
        }
    }

    pub fn build_request(
        &self,
        text: &str,
        file: Option<PendingFile>,
        session_id: Option<String>,
    ) -> OutgoingRequest {
        match file {
            Some(file) => OutgoingRequest::Upload {
                file,
                question: self.question_for(text),
                session_id,
            },
            None => OutgoingRequest::Chat {
                message: text.to_string(),
                session_id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty() {
        let coordinator = SendCoordinator::default();
        assert_eq!(
            coordinator.validate("  ", None),
            Err(ValidationError::EmptyMessage)
        );
        assert!(coordinator.validate("", Some(&PendingFile::from_path("a.pdf"))).is_ok());
        assert!(coordinator.validate("hi", None).is_ok());
    }

    #[test]
    fn test_validate_rejects_while_sending() {
        let mut coordinator = SendCoordinator::default();
        coordinator.state = SendState::Sending {
            task: TaskId(0),
            target: Selection {
                session_id: None,
                epoch: 0,
            },
        };
        assert_eq!(
            coordinator.validate("hi", None),
            Err(ValidationError::SendInFlight)
        );
    }

    #[test]
    fn test_upload_uses_default_question() {
        let coordinator = SendCoordinator::default();
        let file = PendingFile::from_path("/tmp/docs/report.pdf");
        assert_eq!(file.name, "report.pdf");

        let request = coordinator.build_request("", Some(file.clone()), None);
        assert_eq!(
            request,
            OutgoingRequest::Upload {
                file: file.clone(),
                question: "Explain this file".to_string(),
                session_id: None,
            }
        );

        let echo = coordinator.echo_message("", Some(&file));
        assert_eq!(echo.content, "[Attached: report.pdf] Explain this file");
    }

    #[test]
    fn test_chat_request_keeps_text() {
        let coordinator = SendCoordinator::default();
        let request = coordinator.build_request("Hello", None, Some("s1".to_string()));
        assert_eq!(
            request,
            OutgoingRequest::Chat {
                message: "Hello".to_string(),
                session_id: Some("s1".to_string()),
            }
        );
    }
}
