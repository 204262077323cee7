//! Integration tests for HTTP error mapping in the typed API.

use confab_core::api::ChatApi;
use confab_core::error::TransportErrorKind;
use confab_core::transport::Transport;
use confab_core::types::ChatMessage;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(base_url: &str) -> ChatApi {
    ChatApi::new(Transport::new(base_url, None).unwrap())
}

#[tokio::test]
async fn test_status_error_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/delete/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Session not found"})))
        .mount(&server)
        .await;

    let err = api_for(&server.uri())
        .delete_session("nope")
        .await
        .unwrap_err();
    assert_eq!(err.kind, TransportErrorKind::HttpStatus);
    assert_eq!(err.status, Some(404));
    assert!(err.is_not_found());
    assert_eq!(err.path, "/delete/nope");
    assert_eq!(err.to_string(), "HTTP 404: Session not found (/delete/nope)");
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = api_for(&server.uri()).list_sessions().await.unwrap_err();
    assert_eq!(err.kind, TransportErrorKind::Decode);
    assert_eq!(err.status, None);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let err = api_for(&uri).list_sessions().await.unwrap_err();
    assert_eq!(err.kind, TransportErrorKind::Network);
}

#[tokio::test]
async fn test_history_skips_unknown_roles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"role": "system", "content": "be nice"},
            {"role": "user", "content": "hi"},
            {"role": "ai", "content": "hello"},
            {"role": "assistant", "content": "again"}
        ])))
        .mount(&server)
        .await;

    let history = api_for(&server.uri()).history("s1").await.unwrap();
    assert_eq!(
        history,
        vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
            ChatMessage::assistant("again"),
        ]
    );
}

#[tokio::test]
async fn test_ids_are_path_encoded_under_base_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/history/a%20b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&format!("{}/api/", server.uri()));
    assert!(api.history("a b").await.unwrap().is_empty());
    server.verify().await;
}
