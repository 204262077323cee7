//! Conversation data model shared by the directory, buffer and API layers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who authored a message.
///
/// The server stores assistant turns as `"ai"`; both spellings decode to
/// `Assistant` and encode back as `"assistant"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "ai")]
    Assistant,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "assistant" | "ai" => Ok(Self::Assistant),
            _ => Err(format!("Unknown message role: {value}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single immutable chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// A persisted conversation as shown in the session directory.
///
/// `title` is derived client-side and never authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub title: String,
    /// How the title was obtained; only `Derived` titles are reused across refreshes.
    pub title_source: TitleSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    /// First words of the first user message.
    Derived,
    /// The session has no user message yet.
    Fallback,
    /// History fetch failed; the title is the raw id.
    Identifier,
}

impl Session {
    pub fn new(id: impl Into<String>, title: impl Into<String>, title_source: TitleSource) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            title_source,
        }
    }
}

/// Returns a shortened session id for display (first 8 chars).
pub fn short_session_id(id: &str) -> String {
    if id.chars().count() > 8 {
        let prefix: String = id.chars().take(8).collect();
        format!("{prefix}…")
    } else {
        id.to_string()
    }
}
