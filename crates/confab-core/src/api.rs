//! Typed client for the chat service endpoints.
//!
//! | Operation      | Method/Path            |
//! |----------------|------------------------|
//! | list sessions  | `GET /sessions`        |
//! | get history    | `GET /history/{id}`    |
//! | send message   | `POST /chat`           |
//! | upload + query | `POST /upload` (multipart) |
//! | delete session | `DELETE /delete/{id}`  |

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TransportError;
use crate::transport::{Endpoint, Transport};
use crate::types::{ChatMessage, Role};

/// An entry of `GET /sessions`: either a bare id or an object with `id`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SessionRef {
    Id(String),
    Object { id: String },
}

impl SessionRef {
    pub fn into_id(self) -> String {
        match self {
            SessionRef::Id(id) | SessionRef::Object { id } => id,
        }
    }
}

/// Reply of `POST /chat` and `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub session_id: String,
    pub reply: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    session_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: String,
}

/// A file upload with its question, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub question: String,
    pub session_id: Option<String>,
}

impl Upload {
    fn into_form(self) -> Form {
        let form = Form::new()
            .part("file", Part::bytes(self.bytes).file_name(self.file_name))
            .text("question", self.question);
        match self.session_id {
            Some(id) => form.text("session_id", id),
            None => form,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatApi {
    transport: Transport,
}

impl ChatApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Lists the ids of all sessions known to the server.
    pub async fn list_sessions(&self) -> Result<Vec<String>, TransportError> {
        let refs: Vec<SessionRef> = self.transport.get(&Endpoint::new("sessions")).await?;
        Ok(refs.into_iter().map(SessionRef::into_id).collect())
    }

    /// Loads the ordered history of a session.
    ///
    /// Messages with roles other than user/assistant are skipped.
    pub async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>, TransportError> {
        let endpoint = Endpoint::new("history").join(session_id);
        let wire: Vec<WireMessage> = self.transport.get(&endpoint).await?;
        Ok(wire
            .into_iter()
            .filter_map(|msg| match msg.role.parse::<Role>() {
                Ok(role) => Some(ChatMessage {
                    role,
                    content: msg.content,
                }),
                Err(reason) => {
                    debug!(%session_id, %reason, "skipping history message");
                    None
                }
            })
            .collect())
    }

    /// Sends a plain message. `session_id: None` asks the server to create a session.
    pub async fn chat(
        &self,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, TransportError> {
        let body = ChatRequest {
            message,
            session_id,
        };
        self.transport
            .post_json(&Endpoint::new("chat"), &body)
            .await
    }

    /// Uploads a file with a question about it.
    pub async fn upload(&self, upload: Upload) -> Result<ChatReply, TransportError> {
        self.transport
            .post_multipart(&Endpoint::new("upload"), upload.into_form())
            .await
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), TransportError> {
        self.transport
            .delete(&Endpoint::new("delete").join(session_id))
            .await
    }
}
