//! Session directory: the list of known sessions and their display titles.
//!
//! The list is always replaced wholesale by a refresh, never patched locally,
//! so server-side deletions show up and titles cannot drift.

use std::collections::HashMap;

use crate::error::TransportError;
use crate::types::{ChatMessage, Session, TitleSource};

/// Title used for a session with no user message yet.
pub const DEFAULT_FALLBACK_TITLE: &str = "New Chat";

/// Number of words of the first user message kept in a title.
pub const DEFAULT_TITLE_WORDS: usize = 4;

/// How titles are derived from history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRules {
    pub words: usize,
    pub fallback: String,
}

impl Default for TitleRules {
    fn default() -> Self {
        Self {
            words: DEFAULT_TITLE_WORDS,
            fallback: DEFAULT_FALLBACK_TITLE.to_string(),
        }
    }
}

/// Derives a title from the first user message of a history.
pub fn derive_title(messages: &[ChatMessage], rules: &TitleRules) -> (String, TitleSource) {
    let title = messages
        .iter()
        .find(|msg| msg.is_user())
        .map(|msg| {
            msg.content
                .split_whitespace()
                .take(rules.words.max(1))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|title| !title.is_empty());

    match title {
        Some(title) => (title, TitleSource::Derived),
        None => (rules.fallback.clone(), TitleSource::Fallback),
    }
}

/// Builds a directory entry from the outcome of its history fetch.
///
/// A failed fetch keeps the session, titled by its raw id.
pub fn session_from_history(
    id: String,
    history: Result<Vec<ChatMessage>, TransportError>,
    rules: &TitleRules,
) -> Session {
    match history {
        Ok(messages) => {
            let (title, source) = derive_title(&messages, rules);
            Session::new(id, title, source)
        }
        Err(_) => Session::new(id.clone(), id, TitleSource::Identifier),
    }
}

/// Case-insensitive substring filter on titles. Blank term returns everything.
pub fn filter_sessions(sessions: &[Session], term: &str) -> Vec<Session> {
    if term.trim().is_empty() {
        return sessions.to_vec();
    }
    let needle = term.to_lowercase();
    sessions
        .iter()
        .filter(|session| session.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[derive(Debug, Default, Clone)]
pub struct SessionDirectory {
    sessions: Vec<Session>,
    search: String,
    /// Error from the last refresh whose session listing failed.
    pub last_error: Option<String>,
}

impl SessionDirectory {
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.iter().any(|session| session.id == id)
    }

    /// Pure filter over the in-memory list; never mutates it.
    pub fn filter(&self, term: &str) -> Vec<Session> {
        filter_sessions(&self.sessions, term)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Sessions matching the current search term.
    pub fn visible(&self) -> Vec<Session> {
        self.filter(&self.search)
    }

    /// Titles that can be reused by the next refresh, keyed by id.
    ///
    /// Only derived titles are stable: the first user message never changes,
    /// while fallback and id titles may improve once history is available.
    pub fn reusable_titles(&self) -> HashMap<String, String> {
        self.sessions
            .iter()
            .filter(|session| session.title_source == TitleSource::Derived)
            .map(|session| (session.id.clone(), session.title.clone()))
            .collect()
    }

    /// Applies a refresh result. Last completion wins.
    pub fn apply_refresh(&mut self, result: Result<Vec<Session>, TransportError>) {
        match result {
            Ok(sessions) => {
                self.sessions = sessions;
                self.last_error = None;
            }
            Err(err) => {
                self.last_error = Some(format!("Failed to load sessions: {err}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, title: &str) -> Session {
        Session::new(id, title, TitleSource::Derived)
    }

    #[test]
    fn test_derive_title_first_four_words() {
        let messages = vec![
            ChatMessage::assistant("Welcome"),
            ChatMessage::user("How do I  configure the proxy server?"),
            ChatMessage::user("second question"),
        ];
        let (title, source) = derive_title(&messages, &TitleRules::default());
        assert_eq!(title, "How do I configure");
        assert_eq!(source, TitleSource::Derived);
    }

    #[test]
    fn test_derive_title_fallback_without_user_message() {
        let (title, source) =
            derive_title(&[ChatMessage::assistant("hello")], &TitleRules::default());
        assert_eq!(title, "New Chat");
        assert_eq!(source, TitleSource::Fallback);

        let (title, _) = derive_title(&[ChatMessage::user("   ")], &TitleRules::default());
        assert_eq!(title, "New Chat");
    }

    #[test]
    fn test_session_from_failed_history_uses_id() {
        let err = TransportError::http_status("/history/s9", 500, "");
        let session = session_from_history("s9".to_string(), Err(err), &TitleRules::default());
        assert_eq!(session.title, "s9");
        assert_eq!(session.title_source, TitleSource::Identifier);
    }

    #[test]
    fn test_filter_case_insensitive() {
        let sessions = vec![session("1", "Rust lifetimes"), session("2", "Pasta recipes")];
        let filtered = filter_sessions(&sessions, "RUST");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "1");
    }

    #[test]
    fn test_filter_blank_term_is_identity() {
        let sessions = vec![session("1", "a"), session("2", "b")];
        assert_eq!(filter_sessions(&sessions, ""), sessions);
        assert_eq!(filter_sessions(&sessions, "   "), sessions);
    }

    #[test]
    fn test_filter_is_idempotent_and_pure() {
        let mut directory = SessionDirectory::default();
        directory.apply_refresh(Ok(vec![
            session("1", "Rust lifetimes"),
            session("2", "rusty bikes"),
            session("3", "Pasta"),
        ]));
        let once = directory.filter("rust");
        let twice = filter_sessions(&once, "rust");
        assert_eq!(once, twice);
        assert_eq!(directory.sessions().len(), 3);
    }

    #[test]
    fn test_refresh_failure_keeps_previous_list() {
        let mut directory = SessionDirectory::default();
        directory.apply_refresh(Ok(vec![session("1", "a")]));
        directory.apply_refresh(Err(TransportError::network("/sessions", "down")));
        assert!(directory.contains("1"));
        assert!(directory.last_error.is_some());

        directory.apply_refresh(Ok(vec![]));
        assert!(directory.sessions().is_empty());
        assert!(directory.last_error.is_none());
    }

    #[test]
    fn test_reusable_titles_only_derived() {
        let mut directory = SessionDirectory::default();
        directory.apply_refresh(Ok(vec![
            session("1", "Hello there"),
            Session::new("2", "New Chat", TitleSource::Fallback),
            Session::new("3", "3", TitleSource::Identifier),
        ]));
        let titles = directory.reusable_titles();
        assert_eq!(titles.len(), 1);
        assert_eq!(titles.get("1").map(String::as_str), Some("Hello there"));
    }
}
