//! End-to-end generation against a mock HTTP endpoint.

use std::sync::Arc;
use std::time::Duration;

use lumen_stream::{
    GenerationError, GenerationSession, HttpTransport, LumenConfig, SessionSnapshot, SessionState,
    StaticIdentity, TransportConfig, TypewriterConfig,
};
use pretty_assertions::assert_eq;
use tokio::sync::watch;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STREAM_PATH: &str = "/api/botPromptStream";

fn fast_config(server: &MockServer) -> LumenConfig {
    LumenConfig {
        transport: TransportConfig {
            endpoint: format!("{}{STREAM_PATH}", server.uri()),
            request_timeout_ms: 2_000,
            retry_delay_ms: 10,
            ..TransportConfig::default()
        },
        typewriter: TypewriterConfig {
            tick_interval_ms: 1,
            idle_threshold_ms: 300,
            recheck_grace_ms: 50,
        },
        ..LumenConfig::default()
    }
}

fn session_for(config: LumenConfig, identity: StaticIdentity) -> GenerationSession {
    let transport = HttpTransport::new(config.transport.clone()).expect("transport");
    GenerationSession::new(Arc::new(transport), Arc::new(identity), config)
}

async fn wait_for_terminal(updates: &mut watch::Receiver<SessionSnapshot>) -> SessionSnapshot {
    tokio::time::timeout(
        Duration::from_secs(10),
        updates.wait_for(|s| s.state.is_terminal()),
    )
    .await
    .expect("generation did not settle")
    .expect("session dropped")
    .clone()
}

#[tokio::test]
async fn test_generation_end_to_end() {
    let server = MockServer::start().await;
    let body = [
        r#"{"id":"prompt-1024","choices":[{"delta":{"content":"Goal: write email\n\n"}}]}"#,
        r#"{"id":"prompt-1024","choices":[{"delta":{"content":"Tone: formal"}}]}"#,
    ]
    .join("\n");
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .and(body_string_contains("openid=user-1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(fast_config(&server), StaticIdentity::new("user-1"));
    let mut updates = session.subscribe();
    session.start("Write an email to my landlord").unwrap();

    let done = wait_for_terminal(&mut updates).await;

    assert_eq!(done.state, SessionState::Finished);
    assert_eq!(done.full_content, "Goal: write email\n\nTone: formal");
    assert_eq!(done.document.len(), 2);
    assert_eq!(done.document.sections[0].title, "Goal");
    assert_eq!(done.document.sections[0].content, vec!["write email"]);
    assert_eq!(done.document.sections[1].title, "Tone");
    assert_eq!(done.document.sections[1].content, vec!["formal"]);

    let id = done.generation_id.expect("generation id");
    assert_eq!(id.as_str(), "prompt-1024");
    assert_eq!(id.numeric(), Some("1024"));
    assert!(done.time_to_first_chunk.is_some());
}

#[tokio::test]
async fn test_missing_identity_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_for(fast_config(&server), StaticIdentity::anonymous());

    assert_eq!(session.start("hello"), Err(GenerationError::AuthMissing));
    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, SessionState::Errored);
    assert!(snapshot.error.expect("error report").requires_login);
}

#[tokio::test]
async fn test_server_failure_surfaces_after_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(STREAM_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let mut session = session_for(fast_config(&server), StaticIdentity::new("user-1"));
    let mut updates = session.subscribe();
    session.start("hello").unwrap();

    let failed = wait_for_terminal(&mut updates).await;
    assert_eq!(failed.state, SessionState::Errored);
    assert_eq!(failed.full_content, "");
    assert_eq!(
        failed.display_document().to_plain_text(),
        "Generation failed: Request failed: 500 Internal Server Error\n"
    );
}

#[tokio::test]
async fn test_cancel_during_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Goal: never shown")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let mut session = session_for(fast_config(&server), StaticIdentity::new("user-1"));
    let mut updates = session.subscribe();
    session.start("hello").unwrap();
    assert!(session.is_active());

    session.cancel();
    updates.borrow_and_update();
    assert_eq!(session.state(), SessionState::Idle);

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(!updates.has_changed().unwrap());
    assert_eq!(session.snapshot().full_content, "");
}
