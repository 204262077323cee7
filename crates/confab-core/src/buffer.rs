//! Conversation buffer: the ordered messages of the active session.
//!
//! `current_session_id == None` means a draft: the messages are local only
//! and nothing has been persisted yet.

use tracing::debug;

use crate::error::TransportError;
use crate::types::ChatMessage;

/// The active selection captured at a point in time.
///
/// Sends record this when they start and only touch the buffer on completion
/// if it still matches. The epoch changes on every draft start and every
/// load, so reopening the same session is a new selection too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub session_id: Option<String>,
    pub epoch: u64,
}

#[derive(Debug, Default, Clone)]
pub struct ConversationBuffer {
    current_session_id: Option<String>,
    messages: Vec<ChatMessage>,
    epoch: u64,
    loading: bool,
    /// Error from the last load of the active session.
    pub last_error: Option<String>,
}

impl ConversationBuffer {
    pub fn current_session_id(&self) -> Option<&str> {
        self.current_session_id.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_draft(&self) -> bool {
        self.current_session_id.is_none()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn selection(&self) -> Selection {
        Selection {
            session_id: self.current_session_id.clone(),
            epoch: self.epoch,
        }
    }

    /// True if `selection` still describes what the buffer shows.
    pub fn is_selected(&self, selection: &Selection) -> bool {
        selection.epoch == self.epoch && selection.session_id == self.current_session_id
    }

    /// Clears the buffer and starts a fresh, unsaved conversation.
    pub fn start_draft(&mut self) {
        self.messages.clear();
        self.current_session_id = None;
        self.epoch = self.epoch.wrapping_add(1);
        self.loading = false;
        self.last_error = None;
    }

    /// Selects `session_id` and empties the buffer until its history arrives.
    pub fn begin_load(&mut self, session_id: impl Into<String>) {
        self.messages.clear();
        self.current_session_id = Some(session_id.into());
        self.epoch = self.epoch.wrapping_add(1);
        self.loading = true;
        self.last_error = None;
    }

    /// Applies a history response for `session_id`.
    ///
    /// Returns false (and changes nothing) if the response is stale, i.e. the
    /// live selection is no longer `session_id`.
    pub fn apply_history(
        &mut self,
        session_id: &str,
        result: Result<Vec<ChatMessage>, TransportError>,
    ) -> bool {
        if self.current_session_id.as_deref() != Some(session_id) {
            debug!(%session_id, "discarding stale history response");
            return false;
        }
        self.loading = false;
        match result {
            Ok(messages) => {
                self.messages = messages;
                self.last_error = None;
            }
            Err(err) => {
                self.messages.clear();
                self.last_error = Some(format!("Failed to load history: {err}"));
            }
        }
        true
    }

    /// Appends a message without a network call (optimistic echo).
    pub fn append_local(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Appends a message received from the server.
    pub fn append_remote(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Turns a draft into a persisted session once the server assigned an id.
    pub fn adopt_session(&mut self, session_id: impl Into<String>) {
        self.current_session_id = Some(session_id.into());
    }
}
