//! Effect handlers.
//!
//! Handlers are pure async functions that perform network I/O and return a
//! `CoreEvent`. They never touch `AppState`; the runtime spawns them and
//! sends their result to the inbox.

use std::collections::HashMap;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::api::{ChatApi, Upload};
use crate::coordinator::OutgoingRequest;
use crate::directory::{TitleRules, session_from_history};
use crate::error::SendError;
use crate::events::CoreEvent;
use crate::task::TaskId;
use crate::types::{Session, TitleSource};

/// Lists sessions, then resolves a title for each one.
///
/// Ids with a cached derived title skip the history fetch. The remaining
/// history fetches run concurrently; a failed fetch titles the session by
/// its id instead of dropping it.
pub async fn refresh_directory(
    api: ChatApi,
    task: TaskId,
    cached_titles: HashMap<String, String>,
    rules: TitleRules,
) -> CoreEvent {
    let ids = match api.list_sessions().await {
        Ok(ids) => ids,
        Err(err) => {
            warn!(error = %err, "session list failed");
            return CoreEvent::DirectoryRefreshed {
                task,
                result: Err(err),
            };
        }
    };

    let api = &api;
    let cached_titles = &cached_titles;
    let rules = &rules;
    let sessions = join_all(ids.into_iter().map(move |id| async move {
        if let Some(title) = cached_titles.get(&id) {
            return Session::new(id, title.clone(), TitleSource::Derived);
        }
        let history = api.history(&id).await;
        if let Err(err) = &history {
            warn!(session_id = %id, error = %err, "title fetch failed");
        }
        session_from_history(id, history, rules)
    }))
    .await;

    CoreEvent::DirectoryRefreshed {
        task,
        result: Ok(sessions),
    }
}

pub async fn load_history(api: ChatApi, task: TaskId, session_id: String) -> CoreEvent {
    let result = api.history(&session_id).await;
    if let Err(err) = &result {
        warn!(%session_id, error = %err, "history load failed");
    }
    CoreEvent::HistoryLoaded {
        task,
        session_id,
        result,
    }
}

/// Issues the single request of a send.
///
/// The attachment is read from disk only now; a read failure is reported
/// without any request being made.
pub async fn send_message(api: ChatApi, task: TaskId, request: OutgoingRequest) -> CoreEvent {
    let result = match request {
        OutgoingRequest::Chat {
            message,
            session_id,
        } => api
            .chat(&message, session_id.as_deref())
            .await
            .map_err(SendError::from),
        OutgoingRequest::Upload {
            file,
            question,
            session_id,
        } => match tokio::fs::read(&file.path).await {
            Ok(bytes) => {
                debug!(file = %file.name, size = bytes.len(), "uploading attachment");
                api.upload(Upload {
                    file_name: file.name,
                    bytes,
                    question,
                    session_id,
                })
                .await
                .map_err(SendError::from)
            }
            Err(err) => Err(SendError::Attachment {
                path: file.path.display().to_string(),
                message: err.to_string(),
            }),
        },
    };
    CoreEvent::SendCompleted { task, result }
}

pub async fn delete_session(api: ChatApi, task: TaskId, session_id: String) -> CoreEvent {
    let result = api.delete_session(&session_id).await;
    CoreEvent::Deleted {
        task,
        session_id,
        result,
    }
}
