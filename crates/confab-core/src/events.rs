//! Events consumed by the reducer: user intents and task completions.

use crate::api::ChatReply;
use crate::coordinator::PendingFile;
use crate::error::{SendError, TransportError};
use crate::task::TaskId;
use crate::types::{ChatMessage, Session};

#[derive(Debug, Clone)]
pub enum CoreEvent {
    // ------------------------------------------------------------------
    // Intents forwarded by the shell
    // ------------------------------------------------------------------
    /// Send text and/or a file in the active conversation.
    Send {
        text: String,
        file: Option<PendingFile>,
    },
    /// Switch to a session (full reload).
    LoadFor { session_id: String },
    /// Start an unsaved conversation.
    StartDraft,
    /// Delete a session, then refresh the directory.
    Remove { session_id: String },
    /// Re-fetch the session directory.
    Refresh,
    /// Change the directory search term.
    SetFilter { term: String },
    SetDraftText { text: String },
    AttachFile { file: PendingFile },
    DetachFile,

    // ------------------------------------------------------------------
    // Completions sent back by effect handlers
    // ------------------------------------------------------------------
    DirectoryRefreshed {
        task: TaskId,
        result: Result<Vec<Session>, TransportError>,
    },
    HistoryLoaded {
        task: TaskId,
        session_id: String,
        result: Result<Vec<ChatMessage>, TransportError>,
    },
    SendCompleted {
        task: TaskId,
        result: Result<ChatReply, SendError>,
    },
    Deleted {
        task: TaskId,
        session_id: String,
        result: Result<(), TransportError>,
    },
}
