//! Application state composition.
//!
//! ```text
//! AppState
//! ├── directory: SessionDirectory   (session list, search term)
//! ├── buffer: ConversationBuffer    (active session id, messages)
//! ├── draft: DraftInput             (pending text, pending file)
//! ├── coordinator: SendCoordinator  (Idle/Sending, last send error)
//! ├── task_seq: TaskSeq             (async task id generator)
//! └── tasks: Tasks                  (in-flight task bookkeeping)
//! ```
//!
//! Directory and buffer are coupled only through the active session id.

use crate::buffer::ConversationBuffer;
use crate::coordinator::{DraftInput, PendingFile, SendCoordinator};
use crate::directory::{SessionDirectory, TitleRules};
use crate::error::ValidationError;
use crate::task::{TaskId, TaskSeq, Tasks};
use crate::types::{ChatMessage, Session};

#[derive(Debug, Default)]
pub struct AppState {
    pub directory: SessionDirectory,
    pub buffer: ConversationBuffer,
    pub draft: DraftInput,
    pub coordinator: SendCoordinator,
    pub title_rules: TitleRules,
    /// Failure of the last delete, for the shell to report.
    pub remove_error: Option<String>,
    /// The most recent history load; older responses are dropped even for
    /// the same session id.
    pub latest_load: Option<TaskId>,
    pub task_seq: TaskSeq,
    pub tasks: Tasks,
}

impl AppState {
    pub fn new(title_rules: TitleRules, default_question: impl Into<String>) -> Self {
        Self {
            coordinator: SendCoordinator::new(default_question),
            title_rules,
            ..Self::default()
        }
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.buffer.current_session_id()
    }

    /// Checks whether a send may start now.
    ///
    /// A send is refused while the active history is loading: the response
    /// replaces the buffer and would drop the echo.
    ///
    /// # Errors
    /// `LoadInProgress` while loading, otherwise whatever the coordinator
    /// rejects.
    pub fn validate_send(
        &self,
        text: &str,
        file: Option<&PendingFile>,
    ) -> Result<(), ValidationError> {
        self.coordinator.validate(text, file)?;
        if self.buffer.is_loading() {
            return Err(ValidationError::LoadInProgress);
        }
        Ok(())
    }

    /// Builds the read-only view handed to the shell.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sessions: self.directory.visible(),
            search: self.directory.search().to_string(),
            current_session_id: self.buffer.current_session_id().map(str::to_string),
            messages: self.buffer.messages().to_vec(),
            draft_text: self.draft.text.clone(),
            pending_file: self.draft.file.as_ref().map(|file| file.name.clone()),
            is_sending: self.coordinator.is_sending(),
            is_loading: self.buffer.is_loading(),
            is_refreshing: self.tasks.directory_refresh.is_running(),
            send_error: self.coordinator.last_error.clone(),
            load_error: self.buffer.last_error.clone(),
            directory_error: self.directory.last_error.clone(),
            remove_error: self.remove_error.clone(),
        }
    }
}

/// Everything the presentation shell renders, published after each change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Sessions after the search filter.
    pub sessions: Vec<Session>,
    pub search: String,
    pub current_session_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub draft_text: String,
    pub pending_file: Option<String>,
    /// Send affordance must be disabled while true.
    pub is_sending: bool,
    /// Sends are refused while true.
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub send_error: Option<String>,
    pub load_error: Option<String>,
    pub directory_error: Option<String>,
    pub remove_error: Option<String>,
}
