//! Async runtime for the chat core.
//!
//! The runtime owns `AppState` and is the only place effects are executed:
//! - Intents go through `dispatch`, which runs the reducer
//! - Each returned effect is spawned on tokio via `spawn_effect`
//! - Handlers send their completion event to the inbox
//! - `next_event` drains the inbox back through the reducer
//!
//! After every reducer step a fresh `Snapshot` is published on a watch
//! channel so a shell can re-render without polling.
//!
//! ## Module Structure
//!
//! - `handlers.rs`: pure async effect handlers (network I/O)

pub mod handlers;

use std::future::Future;
use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::{mpsc, watch};

use crate::api::ChatApi;
use crate::config::Config;
use crate::coordinator::PendingFile;
use crate::effects::CoreEffect;
use crate::error::ValidationError;
use crate::events::CoreEvent;
use crate::state::{AppState, Snapshot};
use crate::transport::Transport;
use crate::update;

/// Sender for the runtime's event inbox.
pub type CoreEventSender = mpsc::UnboundedSender<CoreEvent>;

/// Receiver for the runtime's event inbox.
pub type CoreEventReceiver = mpsc::UnboundedReceiver<CoreEvent>;

pub struct ChatRuntime {
    state: AppState,
    api: ChatApi,
    inbox_tx: CoreEventSender,
    inbox_rx: CoreEventReceiver,
    notify: watch::Sender<Snapshot>,
}

impl ChatRuntime {
    pub fn new(api: ChatApi, state: AppState) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (notify, _) = watch::channel(state.snapshot());
        Self {
            state,
            api,
            inbox_tx,
            inbox_rx,
            notify,
        }
    }

    /// Builds a runtime talking to `base_url` with the settings of `config`.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn from_config(config: &Config, base_url: &str) -> Result<Self> {
        let transport = Transport::new(base_url, config.request_timeout())?;
        let state = AppState::new(config.title_rules(), config.default_question.clone());
        Ok(Self::new(ChatApi::new(transport), state))
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Returns a receiver that changes after every state mutation.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.notify.subscribe()
    }

    /// Runs one event through the reducer and executes its effects.
    pub fn dispatch(&mut self, event: CoreEvent) {
        let effects = update::update(&mut self.state, event);
        self.notify.send_replace(self.state.snapshot());
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    /// Sends text and/or a file in the active conversation.
    ///
    /// # Errors
    /// Returns the reason when the send is refused; nothing is echoed or
    /// requested in that case.
    pub fn send(
        &mut self,
        text: impl Into<String>,
        file: Option<PathBuf>,
    ) -> Result<(), ValidationError> {
        let text = text.into();
        let file = file.map(PendingFile::from_path);
        self.state.validate_send(&text, file.as_ref())?;
        self.dispatch(CoreEvent::Send { text, file });
        Ok(())
    }

    pub fn load(&mut self, session_id: impl Into<String>) {
        self.dispatch(CoreEvent::LoadFor {
            session_id: session_id.into(),
        });
    }

    pub fn start_draft(&mut self) {
        self.dispatch(CoreEvent::StartDraft);
    }

    pub fn remove(&mut self, session_id: impl Into<String>) {
        self.dispatch(CoreEvent::Remove {
            session_id: session_id.into(),
        });
    }

    pub fn refresh(&mut self) {
        self.dispatch(CoreEvent::Refresh);
    }

    pub fn set_filter(&mut self, term: impl Into<String>) {
        self.dispatch(CoreEvent::SetFilter { term: term.into() });
    }

    /// Waits for one completion and applies it.
    ///
    /// Returns false only if the inbox is closed.
    pub async fn next_event(&mut self) -> bool {
        match self.inbox_rx.recv().await {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Applies completions until no task is in flight.
    pub async fn settle(&mut self) {
        while self.state.tasks.is_any_running() {
            if !self.next_event().await {
                break;
            }
        }
    }

    /// Spawns an async handler and sends its result event to the inbox.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = CoreEvent> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(f().await);
        });
    }

    fn execute_effect(&self, effect: CoreEffect) {
        let api = self.api.clone();
        match effect {
            CoreEffect::RefreshDirectory {
                task,
                cached_titles,
                rules,
            } => self.spawn_effect(move || {
                handlers::refresh_directory(api, task, cached_titles, rules)
            }),
            CoreEffect::LoadHistory { task, session_id } => {
                self.spawn_effect(move || handlers::load_history(api, task, session_id));
            }
            CoreEffect::SendMessage { task, request } => {
                self.spawn_effect(move || handlers::send_message(api, task, request));
            }
            CoreEffect::DeleteSession { task, session_id } => {
                self.spawn_effect(move || handlers::delete_session(api, task, session_id));
            }
        }
    }
}
