//! Session command handlers.

use anyhow::{Result, bail};
use confab_core::ChatRuntime;
use confab_core::types::ChatMessage;

pub async fn list(mut runtime: ChatRuntime, search: Option<&str>) -> Result<()> {
    runtime.refresh();
    runtime.settle().await;
    if let Some(search) = search {
        runtime.set_filter(search);
    }

    let snapshot = runtime.snapshot();
    if let Some(err) = snapshot.directory_error {
        bail!("list sessions: {err}");
    }

    if snapshot.sessions.is_empty() {
        println!("No sessions found.");
    } else {
        for session in snapshot.sessions {
            println!("{}  {}", session.id, session.title);
        }
    }
    Ok(())
}

pub async fn show(mut runtime: ChatRuntime, id: &str) -> Result<()> {
    runtime.load(id);
    runtime.settle().await;

    let snapshot = runtime.snapshot();
    if let Some(err) = snapshot.load_error {
        bail!("show session '{id}': {err}");
    }

    if snapshot.messages.is_empty() {
        println!("Session '{id}' is empty.");
    } else {
        println!("{}", format_transcript(&snapshot.messages));
    }
    Ok(())
}

pub async fn delete(mut runtime: ChatRuntime, id: &str) -> Result<()> {
    runtime.remove(id);
    runtime.settle().await;

    if let Some(err) = runtime.snapshot().remove_error {
        bail!("delete session '{id}': {err}");
    }
    println!("Deleted session {id}");
    Ok(())
}

/// Renders messages as `role: content` blocks separated by blank lines.
pub fn format_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|message| format!("{}: {}", message.role, message.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_transcript() {
        let messages = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];
        assert_eq!(format_transcript(&messages), "user: hi\n\nassistant: hello");
    }
}
