//! One-shot send.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use confab_core::ChatRuntime;
use confab_core::types::Role;

pub async fn run(
    mut runtime: ChatRuntime,
    message: String,
    file: Option<PathBuf>,
    session: Option<String>,
) -> Result<()> {
    if let Some(id) = session {
        runtime.load(&id);
        runtime.settle().await;
        if let Some(err) = runtime.snapshot().load_error {
            bail!("open session '{id}': {err}");
        }
    }

    runtime.send(message, file).context("send message")?;
    runtime.settle().await;

    let snapshot = runtime.snapshot();
    if let Some(err) = snapshot.send_error {
        bail!("{err}");
    }

    let reply = snapshot
        .messages
        .iter()
        .rev()
        .find(|message| message.role == Role::Assistant)
        .map_or("", |message| message.content.as_str());
    println!("{reply}");
    if let Some(id) = snapshot.current_session_id {
        eprintln!("Session: {id}");
    }
    Ok(())
}
