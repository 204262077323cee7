//! Core reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(state, event)`
//! and executes the returned effects. Nothing in this module awaits or
//! touches the network.

use tracing::{debug, info, warn};

use crate::coordinator::{PendingFile, SendState};
use crate::effects::CoreEffect;
use crate::error::{SendError, TransportError};
use crate::events::CoreEvent;
use crate::state::AppState;
use crate::task::{TaskId, TaskKind};
use crate::types::ChatMessage;

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(state: &mut AppState, event: CoreEvent) -> Vec<CoreEffect> {
    match event {
        CoreEvent::Send { text, file } => handle_send(state, text, file),
        CoreEvent::LoadFor { session_id } => {
            debug!(%session_id, "switching session");
            vec![load_session(state, session_id)]
        }
        CoreEvent::StartDraft => {
            debug!("starting draft");
            state.buffer.start_draft();
            vec![]
        }
        CoreEvent::Remove { session_id } => {
            state.remove_error = None;
            let task = start_task(state, TaskKind::Delete);
            vec![CoreEffect::DeleteSession { task, session_id }]
        }
        CoreEvent::Refresh => vec![refresh_directory(state)],
        CoreEvent::SetFilter { term } => {
            state.directory.set_search(term);
            vec![]
        }
        CoreEvent::SetDraftText { text } => {
            state.draft.text = text;
            vec![]
        }
        CoreEvent::AttachFile { file } => {
            state.draft.file = Some(file);
            vec![]
        }
        CoreEvent::DetachFile => {
            state.draft.file = None;
            vec![]
        }

        CoreEvent::DirectoryRefreshed { task, result } => {
            if !state.tasks.state_mut(TaskKind::DirectoryRefresh).finish(task) {
                return vec![];
            }
            if let Ok(sessions) = &result {
                debug!(count = sessions.len(), "directory refreshed");
            }
            state.directory.apply_refresh(result);
            vec![]
        }
        CoreEvent::HistoryLoaded {
            task,
            session_id,
            result,
        } => {
            if !state.tasks.state_mut(TaskKind::HistoryLoad).finish(task) {
                return vec![];
            }
            if state.latest_load != Some(task) {
                debug!(%session_id, "discarding superseded history response");
                return vec![];
            }
            state.latest_load = None;
            state.buffer.apply_history(&session_id, result);
            vec![]
        }
        CoreEvent::SendCompleted { task, result } => handle_send_completed(state, task, result),
        CoreEvent::Deleted {
            task,
            session_id,
            result,
        } => handle_deleted(state, task, &session_id, result),
    }
}

/// Allocates a task id and marks it in flight.
fn start_task(state: &mut AppState, kind: TaskKind) -> TaskId {
    let id = state.task_seq.next_id();
    state.tasks.state_mut(kind).on_started(id);
    id
}

/// Selects `session_id` and fetches its history.
fn load_session(state: &mut AppState, session_id: String) -> CoreEffect {
    state.buffer.begin_load(session_id.clone());
    let task = start_task(state, TaskKind::HistoryLoad);
    state.latest_load = Some(task);
    CoreEffect::LoadHistory { task, session_id }
}

fn refresh_directory(state: &mut AppState) -> CoreEffect {
    let task = start_task(state, TaskKind::DirectoryRefresh);
    CoreEffect::RefreshDirectory {
        task,
        cached_titles: state.directory.reusable_titles(),
        rules: state.title_rules.clone(),
    }
}

/// `Idle --send--> Sending`: echo locally, then issue exactly one request.
fn handle_send(state: &mut AppState, text: String, file: Option<PendingFile>) -> Vec<CoreEffect> {
    if let Err(reason) = state.validate_send(&text, file.as_ref()) {
        debug!(%reason, "send rejected");
        return vec![];
    }

    let target = state.buffer.selection();
    let echo = state.coordinator.echo_message(&text, file.as_ref());
    state.buffer.append_local(echo);

    state.draft.text.clone_from(&text);
    state.draft.file.clone_from(&file);

    let request = state
        .coordinator
        .build_request(&text, file, target.session_id.clone());
    let task = start_task(state, TaskKind::Send);
    state.coordinator.state = SendState::Sending { task, target };
    state.coordinator.last_error = None;

    vec![CoreEffect::SendMessage { task, request }]
}

/// `Sending -> Idle`: reconcile the reply with the session it was sent for.
fn handle_send_completed(
    state: &mut AppState,
    task: TaskId,
    result: Result<crate::api::ChatReply, SendError>,
) -> Vec<CoreEffect> {
    if !state.tasks.state_mut(TaskKind::Send).finish(task) {
        return vec![];
    }
    let SendState::Sending { target, .. } = std::mem::take(&mut state.coordinator.state) else {
        return vec![];
    };

    match result {
        Ok(reply) => {
            let mut effects = Vec::new();
            if state.buffer.is_selected(&target) {
                if state.buffer.is_draft() {
                    info!(session_id = %reply.session_id, "draft persisted as session");
                }
                state.buffer.adopt_session(reply.session_id);
                state.buffer.append_remote(ChatMessage::assistant(reply.reply));
            } else if state.current_session_id() == Some(reply.session_id.as_str()) {
                // Reopened during the send: its history may predate the echo.
                debug!(session_id = %reply.session_id, "session reopened during send; reloading");
                effects.push(load_session(state, reply.session_id));
            } else {
                debug!(
                    session_id = %reply.session_id,
                    "active session changed during send; reply not applied"
                );
            }
            state.draft.clear();
            state.coordinator.last_error = None;
            effects.push(refresh_directory(state));
            effects
        }
        Err(err) => {
            // The echo stays and the pending file is kept for a retry.
            warn!(error = %err, "send failed");
            state.coordinator.last_error = Some(err.to_string());
            vec![]
        }
    }
}

fn handle_deleted(
    state: &mut AppState,
    task: TaskId,
    session_id: &str,
    result: Result<(), TransportError>,
) -> Vec<CoreEffect> {
    if !state.tasks.state_mut(TaskKind::Delete).finish(task) {
        return vec![];
    }

    // A 404 means the session is already gone.
    let gone = match result {
        Ok(()) => true,
        Err(err) => {
            warn!(%session_id, error = %err, "delete failed");
            let gone = err.is_not_found();
            state.remove_error = Some(format!("Failed to delete session: {err}"));
            gone
        }
    };

    if gone && state.buffer.current_session_id() == Some(session_id) {
        state.buffer.start_draft();
    }

    vec![refresh_directory(state)]
}
