//! End-to-end turn tests against a mocked backend: the smart-stream
//! endpoint and the message persistence endpoint together, consumed through
//! the production client stack.

use std::sync::Arc;

use hearth_api::ApiClient;
use hearth_chat::{ChatStreamClient, SessionStore, TurnInput, TurnOutcome};
use hearth_core::ids::ThreadId;
use hearth_core::message::{Complexity, Routing};
use hearth_core::notify::MemoryNotifier;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Persistence endpoint that echoes the posted message back with a
/// server-assigned ID and timestamp, the way the real backend does.
struct EchoMessage;

impl wiremock::Respond for EchoMessage {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let mut message = body;
        let obj = message.as_object_mut().unwrap();
        let _ = obj.insert("id".into(), serde_json::json!("srv_echo"));
        let _ = obj.insert(
            "timestamp".into(),
            serde_json::json!("2026-08-06T12:00:00Z"),
        );
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "ok": true, "message": message }))
    }
}

async fn mock_backend(stream_body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agent/smart-stream"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(stream_body.to_owned(), "text/event-stream"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat/messages"))
        .respond_with(EchoMessage)
        .mount(&server)
        .await;
    server
}

fn session(server: &MockServer) -> (Arc<SessionStore>, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::new());
    let session = Arc::new(SessionStore::new(
        Arc::new(ChatStreamClient::new(server.uri())),
        Arc::new(ApiClient::new(server.uri())),
        notifier.clone(),
    ));
    (session, notifier)
}

#[tokio::test]
async fn full_turn_round_trip() {
    let server = mock_backend(concat!(
        "data: {\"metadata\": {\"model\": \"gpt-fast\", \"complexity\": \"simple\", ",
        "\"routing\": \"direct\", \"tools\": [\"planned\"], \"toolSource\": \"local\", ",
        "\"historyLength\": 2, \"models\": {\"Fast\": \"gpt-fast\"}}}\n\n",
        "data: {\"delta\": \"The lights \"}\n\n",
        "data: {\"delta\": \"are on.\"}\n\n",
        "data: {\"tools\": [\"ha_control\"]}\n\n",
        "data: {\"metrics\": {\"durationMs\": 1250, \"model\": \"gpt-fast\", \"route\": \"direct\"}, \"done\": true}\n\n",
    ))
    .await;
    let (session, notifier) = session(&server);
    let thread: ThreadId = "t1".into();

    let mut renders = Vec::new();
    let outcome = session
        .send(&thread, TurnInput::text("turn on the lights"), |buffer| {
            renders.push(buffer.to_string());
        })
        .await
        .unwrap();

    let message = match outcome {
        TurnOutcome::Completed(message) => message,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(message.content, "The lights are on.");
    assert_eq!(message.id.as_str(), "srv_echo");
    assert_eq!(message.tools_used, vec!["ha_control"], "post-hoc list wins");
    assert_eq!(message.latency_ms, Some(1250));
    assert_eq!(message.model.as_deref(), Some("gpt-fast"));
    assert_eq!(message.complexity, Some(Complexity::Simple));
    assert_eq!(message.routing, Some(Routing::Direct));
    assert_eq!(message.tool_source.as_deref(), Some("local"));
    assert_eq!(message.available_models.len(), 1);

    assert_eq!(renders.last().unwrap(), "The lights are on.");
    assert!(notifier.is_empty());

    // user turn + assistant turn, both persisted
    let persisted: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/api/chat/messages")
        .collect();
    assert_eq!(persisted.len(), 2);

    // the cache mirrors the conversation with server-assigned records
    let cached = session.messages(&thread).unwrap();
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[1].content, "The lights are on.");
}

#[tokio::test]
async fn content_snapshot_replaces_deltas() {
    let server = mock_backend(concat!(
        "data: {\"delta\": \"abc\"}\n\n",
        "data: {\"content\": \"xyz\"}\n\n",
        "data: {\"done\": true}\n\n",
    ))
    .await;
    let (session, _) = session(&server);

    let outcome = session
        .send(&"t1".into(), TurnInput::text("x"), |_| {})
        .await
        .unwrap();
    let TurnOutcome::Completed(message) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(message.content, "xyz");
}

#[tokio::test]
async fn stream_error_keeps_partial_and_skips_persistence() {
    let server = mock_backend(concat!(
        "data: {\"delta\": \"half an answ\"}\n\n",
        "data: {\"error\": \"orchestrator timeout\"}\n\n",
    ))
    .await;
    let (session, _) = session(&server);
    let thread: ThreadId = "t1".into();

    let outcome = session
        .send(&thread, TurnInput::text("x"), |_| {})
        .await
        .unwrap();
    let TurnOutcome::Failed(message) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(message.content, "orchestrator timeout");

    let cached = session.messages(&thread).unwrap();
    assert_eq!(cached.len(), 3);
    assert_eq!(cached[1].content, "half an answ");

    // only the user message reached persistence
    let persisted: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/api/chat/messages")
        .collect();
    assert_eq!(persisted.len(), 1);
}

#[tokio::test]
async fn malformed_lines_do_not_break_the_turn() {
    let server = mock_backend(concat!(
        "data: {\"delta\": \"Hel\"}\n\n",
        "data: {not json}\n\n",
        "data: {\"delta\": \"lo\"}\n\n",
        "data: {\"done\": true}\n\n",
    ))
    .await;
    let (session, _) = session(&server);

    let outcome = session
        .send(&"t1".into(), TurnInput::text("x"), |_| {})
        .await
        .unwrap();
    let TurnOutcome::Completed(message) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(message.content, "Hello");
}

#[tokio::test]
async fn rejected_user_persist_rolls_back_and_notifies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "ok": false, "error": "thread is archived" }),
        ))
        .mount(&server)
        .await;

    let (session, notifier) = session(&server);
    let thread: ThreadId = "t1".into();

    let err = session
        .send(&thread, TurnInput::text("hello"), |_| {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("thread is archived"));

    // optimistic stub rolled back; the soft failure surfaced as a notice
    assert!(session.messages(&thread).unwrap().is_empty());
    assert_eq!(notifier.len(), 1);

    // the stream endpoint was never contacted
    let streamed = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/api/agent/smart-stream")
        .count();
    assert_eq!(streamed, 0);
}
