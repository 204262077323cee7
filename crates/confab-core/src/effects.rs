//! Effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They describe network work only; the reducer never performs I/O itself.

use std::collections::HashMap;

use crate::coordinator::OutgoingRequest;
use crate::directory::TitleRules;
use crate::task::TaskId;

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEffect {
    /// List sessions and resolve a title for each.
    RefreshDirectory {
        task: TaskId,
        /// Titles already known by id; their history is not fetched again.
        cached_titles: HashMap<String, String>,
        rules: TitleRules,
    },

    /// Fetch the history of a session.
    LoadHistory { task: TaskId, session_id: String },

    /// Issue the single request of a send.
    SendMessage {
        task: TaskId,
        request: OutgoingRequest,
    },

    /// Delete a session on the server.
    DeleteSession { task: TaskId, session_id: String },
}

impl CoreEffect {
    pub fn task(&self) -> TaskId {
        match self {
            CoreEffect::RefreshDirectory { task, .. }
            | CoreEffect::LoadHistory { task, .. }
            | CoreEffect::SendMessage { task, .. }
            | CoreEffect::DeleteSession { task, .. } => *task,
        }
    }
}
