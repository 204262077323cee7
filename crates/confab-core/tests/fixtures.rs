//! Mock chat service helpers for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use confab_core::ChatRuntime;
use confab_core::config::Config;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a runtime with default settings pointed at `server`.
pub fn runtime_for(server: &MockServer) -> ChatRuntime {
    ChatRuntime::from_config(&Config::default(), &server.uri()).unwrap()
}

/// A history body as the server stores it (assistant turns use role "ai").
pub fn history_body(turns: &[(&str, &str)]) -> Value {
    Value::Array(
        turns
            .iter()
            .map(|(role, content)| json!({"role": role, "content": content}))
            .collect(),
    )
}

pub async fn mount_sessions(server: &MockServer, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ids))
        .mount(server)
        .await;
}

pub async fn mount_history(server: &MockServer, id: &str, turns: &[(&str, &str)]) {
    mount_history_delayed(server, id, turns, Duration::ZERO).await;
}

pub async fn mount_history_delayed(
    server: &MockServer,
    id: &str,
    turns: &[(&str, &str)],
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path(format!("/history/{id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(history_body(turns))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

pub fn reply_body(session_id: &str, reply: &str) -> Value {
    json!({"session_id": session_id, "reply": reply})
}

/// Requests the server received on `route`.
pub async fn requests_to(server: &MockServer, route: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == route)
        .collect()
}
