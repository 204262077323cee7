//! Interactive chat loop.
//!
//! Reads lines from stdin and forwards them to the core as intents while
//! completions keep arriving. Output is redrawn from the core's snapshot:
//! conversation text on stdout, status and errors on stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use confab_core::ChatRuntime;
use confab_core::coordinator::PendingFile;
use confab_core::events::CoreEvent;
use confab_core::state::Snapshot;
use confab_core::types::{ChatMessage, Session, short_session_id};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  /new               start a new chat
  /sessions          list sessions
  /search [TERM]     filter sessions by title (no term clears)
  /open <N|ID>       open a session by list number or id
  /delete <N|ID>     delete a session
  /attach <PATH>     attach a file to the next message (blank line sends it)
  /detach            drop the attached file
  /refresh           reload the session list
  /help              show this help
  /quit              exit
Any other line is sent as a message.";

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Message(String),
    New,
    Sessions,
    Search(String),
    Open(String),
    Delete(String),
    Attach(PathBuf),
    Detach,
    Refresh,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return ReplCommand::Message(line.to_string());
        };

        let (name, arg) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(name, arg)| (name, arg.trim()));
        let required = |make: fn(String) -> ReplCommand| {
            if arg.is_empty() {
                ReplCommand::Invalid(format!("Usage: /{name} <argument>"))
            } else {
                make(arg.to_string())
            }
        };

        match name {
            "new" => ReplCommand::New,
            "sessions" | "ls" => ReplCommand::Sessions,
            "search" => ReplCommand::Search(arg.to_string()),
            "open" => required(ReplCommand::Open),
            "delete" | "rm" => required(ReplCommand::Delete),
            "attach" => required(|path| ReplCommand::Attach(PathBuf::from(path))),
            "detach" => ReplCommand::Detach,
            "refresh" => ReplCommand::Refresh,
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" | "q" => ReplCommand::Quit,
            other => ReplCommand::Invalid(format!("Unknown command: /{other} (try /help)")),
        }
    }
}

/// Resolves `/open 2` to the id of the second visible session; anything else
/// is taken as an id.
fn resolve_session_ref(sessions: &[Session], reference: &str) -> String {
    reference
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| sessions.get(index))
        .map_or_else(|| reference.to_string(), |session| session.id.clone())
}

fn print_sessions(snapshot: &Snapshot) {
    if snapshot.sessions.is_empty() {
        if snapshot.search.is_empty() {
            eprintln!("No sessions yet.");
        } else {
            eprintln!("No sessions match '{}'.", snapshot.search);
        }
        return;
    }
    for (index, session) in snapshot.sessions.iter().enumerate() {
        let marker = if snapshot.current_session_id.as_deref() == Some(session.id.as_str()) {
            '*'
        } else {
            ' '
        };
        eprintln!(
            "{marker}{:>3}. {}  ({})",
            index + 1,
            session.title,
            short_session_id(&session.id)
        );
    }
}

fn print_message(message: &ChatMessage) {
    let who = if message.is_user() { "you" } else { "ai" };
    println!("{who}> {}", message.content);
}

/// Tracks what has already been printed so each snapshot only adds the delta.
#[derive(Debug, Default)]
struct TranscriptView {
    session_id: Option<String>,
    shown: usize,
    errors: [Option<String>; 4],
    was_sending: bool,
}

impl TranscriptView {
    fn render(&mut self, snapshot: &Snapshot) {
        let switched = snapshot.current_session_id != self.session_id;
        let adopted = self.session_id.is_none()
            && snapshot.current_session_id.is_some()
            && snapshot.messages.len() >= self.shown;

        if switched && adopted {
            if let Some(id) = &snapshot.current_session_id {
                eprintln!("(saved as session {})", short_session_id(id));
            }
        } else if switched || snapshot.messages.len() < self.shown {
            match &snapshot.current_session_id {
                Some(id) => eprintln!("--- session {} ---", short_session_id(id)),
                None => eprintln!("--- new chat ---"),
            }
            self.shown = 0;
        }
        self.session_id.clone_from(&snapshot.current_session_id);

        for message in snapshot.messages.iter().skip(self.shown) {
            print_message(message);
        }
        self.shown = snapshot.messages.len();

        if snapshot.is_sending && !self.was_sending {
            eprintln!("(waiting for reply...)");
        }
        self.was_sending = snapshot.is_sending;

        let errors = [
            &snapshot.send_error,
            &snapshot.load_error,
            &snapshot.directory_error,
            &snapshot.remove_error,
        ];
        for (seen, current) in self.errors.iter_mut().zip(errors) {
            if current != seen {
                if let Some(err) = current {
                    eprintln!("error: {err}");
                }
                seen.clone_from(current);
            }
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

fn send_with_pending_file(runtime: &mut ChatRuntime, text: String) {
    let file = runtime
        .state()
        .draft
        .file
        .as_ref()
        .map(|file| file.path.clone());
    if let Err(err) = runtime.send(text, file) {
        eprintln!("{err}");
    }
}

fn handle_line(runtime: &mut ChatRuntime, line: &str) -> Flow {
    match ReplCommand::parse(line) {
        // A blank line sends a pending file with the default question.
        ReplCommand::Empty if runtime.state().draft.file.is_some() => {
            send_with_pending_file(runtime, String::new());
        }
        ReplCommand::Empty => {}
        ReplCommand::Message(text) => send_with_pending_file(runtime, text),
        ReplCommand::New => runtime.start_draft(),
        ReplCommand::Sessions => print_sessions(&runtime.snapshot()),
        ReplCommand::Search(term) => {
            runtime.set_filter(term);
            print_sessions(&runtime.snapshot());
        }
        ReplCommand::Open(reference) => {
            let id = resolve_session_ref(&runtime.snapshot().sessions, &reference);
            runtime.load(id);
        }
        ReplCommand::Delete(reference) => {
            let id = resolve_session_ref(&runtime.snapshot().sessions, &reference);
            eprintln!("Deleting {}...", short_session_id(&id));
            runtime.remove(id);
        }
        ReplCommand::Attach(path) => {
            let file = PendingFile::from_path(path);
            eprintln!("Attached {}", file.name);
            runtime.dispatch(CoreEvent::AttachFile { file });
        }
        ReplCommand::Detach => runtime.dispatch(CoreEvent::DetachFile),
        ReplCommand::Refresh => runtime.refresh(),
        ReplCommand::Help => eprintln!("{HELP}"),
        ReplCommand::Quit => return Flow::Quit,
        ReplCommand::Invalid(message) => eprintln!("{message}"),
    }
    Flow::Continue
}

pub async fn run(mut runtime: ChatRuntime, base_url: &str) -> Result<()> {
    eprintln!("confab: connected to {base_url} (type /help for commands)");

    let mut view = TranscriptView::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    runtime.refresh();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("read stdin")? else {
                    // Let in-flight requests land before exiting on EOF.
                    runtime.settle().await;
                    view.render(&runtime.snapshot());
                    break;
                };
                if let Flow::Quit = handle_line(&mut runtime, &line) {
                    break;
                }
            }
            _ = runtime.next_event() => {}
        }
        view.render(&runtime.snapshot());
    }

    Ok(())
}
