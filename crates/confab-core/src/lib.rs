//! Core confab library (session sync state machine, transport, config).
//!
//! The pieces fit together Elm-style:
//! - `state` owns everything (directory, buffer, draft, send coordinator)
//! - `update` is the reducer: `(state, event) -> effects`, no I/O
//! - `runtime` executes effects against the HTTP API and feeds results back

pub mod api;
pub mod buffer;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod effects;
pub mod error;
pub mod events;
pub mod logging;
pub mod runtime;
pub mod state;
pub mod task;
pub mod transport;
pub mod types;
pub mod update;

pub use runtime::ChatRuntime;
pub use state::{AppState, Snapshot};
