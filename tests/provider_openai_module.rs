mod common;

use common::MockServer;
use repocraft::intent::{IntentParser, ParseError, ParserArbiter, ParserSource};
use repocraft::provider::{CompletionService, OpenAiClient, ServiceError};
use repocraft::shared::EventLog;
use serde_json::json;
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

fn completion_body(content: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

#[test]
fn complete_posts_chat_request_and_returns_trimmed_content() {
    let server = MockServer::start(1, |_| (200, completion_body("  {\"name\":\"demo\"}\n")));
    let client = OpenAiClient::new(&format!("{}/v1/", server.base_url), "sk-test", "gpt-4o-mini");

    let reply = client
        .complete("system text", "Instruction: make repo demo", 0.0)
        .expect("reply");
    assert_eq!(reply, "{\"name\":\"demo\"}");

    let requests = server.finish();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/v1/chat/completions");
    assert_eq!(requests[0].authorization, "Bearer sk-test");
    let body = requests[0].json();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["temperature"].as_f64(), Some(0.0));
    assert_eq!(body["max_tokens"], 200);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "system text");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "Instruction: make repo demo");
}

#[test]
fn non_success_status_is_an_http_error() {
    let server = MockServer::start(1, |_| (429, "{\"error\":\"rate limited\"}".to_string()));
    let client = OpenAiClient::new(&server.base_url, "sk-test", "gpt-4o-mini");

    let err = client.complete("s", "u", 0.0).expect_err("http error");
    match err {
        ServiceError::Http { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("rate limited"));
        }
        other => panic!("unexpected error: {other}"),
    }
    server.finish();
}

#[test]
fn missing_choices_is_an_empty_reply() {
    let server = MockServer::start(1, |_| (200, "{\"choices\":[]}".to_string()));
    let client = OpenAiClient::new(&server.base_url, "sk-test", "gpt-4o-mini");

    let err = client.complete("s", "u", 0.0).expect_err("empty");
    assert!(matches!(err, ServiceError::EmptyReply));
    server.finish();
}

#[test]
fn unreachable_service_is_a_transport_error() {
    let client = OpenAiClient::new("http://127.0.0.1:1", "sk-test", "gpt-4o-mini");
    let err = client.complete("s", "u", 0.0).expect_err("transport");
    assert!(matches!(err, ServiceError::Transport(_)));
}

#[test]
fn intent_parser_reads_fields_from_model_reply() {
    let server = MockServer::start(1, |_| {
        (
            200,
            completion_body(
                "{\"name\":\"atlas\",\"private\":false,\"description\":\"maps\",\"auto_init\":null}",
            ),
        )
    });
    let client = OpenAiClient::new(&server.base_url, "sk-test", "gpt-4o-mini");

    let fields = IntentParser::new(client)
        .parse_with_model("create a public repo atlas described as maps")
        .expect("fields");
    assert_eq!(fields.name.as_deref(), Some("atlas"));
    assert_eq!(fields.private, Some(false));
    assert_eq!(fields.description.as_deref(), Some("maps"));
    assert_eq!(fields.auto_init, None);

    let requests = server.finish();
    let body = requests[0].json();
    assert_eq!(
        body["messages"][1]["content"],
        "Instruction: create a public repo atlas described as maps"
    );
}

#[test]
fn server_error_makes_arbiter_fall_back() {
    let server = MockServer::start(1, |_| (500, "{}".to_string()));
    let client = OpenAiClient::new(&server.base_url, "sk-test", "gpt-4o-mini");

    let err = IntentParser::new(&client)
        .parse_with_model("x")
        .expect_err("server error");
    assert!(matches!(err, ParseError::Service(ServiceError::Http { status: 500, .. })));
    server.finish();

    let server = MockServer::start(1, |_| (500, "{}".to_string()));
    let client = OpenAiClient::new(&server.base_url, "sk-test", "gpt-4o-mini");
    let resolved = ParserArbiter::new(client, EventLog::disabled())
        .resolve_traced("create a private repo called 'demo' with readme");
    assert!(matches!(resolved.source, ParserSource::Fallback { .. }));
    assert_eq!(resolved.fields.name.as_deref(), Some("demo"));
    server.finish();
}

fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind silent server");
    let base_url = format!("http://{}", listener.local_addr().expect("local addr"));
    thread::spawn(move || {
        let (_stream, _) = listener.accept().expect("accept");
        thread::sleep(Duration::from_secs(5));
    });
    base_url
}

#[test]
fn unresponsive_service_times_out_as_transport_error() {
    let client = OpenAiClient::new(&silent_server(), "sk-test", "gpt-4o-mini")
        .with_request_timeout(Duration::from_millis(200));

    let started = Instant::now();
    let err = client.complete("s", "u", 0.0).expect_err("timeout");
    assert!(matches!(err, ServiceError::Transport(_)), "unexpected error: {err}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn unresponsive_service_still_resolves_through_fallback() {
    let client = OpenAiClient::new(&silent_server(), "sk-test", "gpt-4o-mini")
        .with_request_timeout(Duration::from_millis(200));

    let started = Instant::now();
    let resolved = ParserArbiter::new(client, EventLog::disabled())
        .resolve_traced("create a private repo called 'demo' with readme");
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(matches!(resolved.source, ParserSource::Fallback { .. }));
    assert_eq!(resolved.fields.name.as_deref(), Some("demo"));
    assert_eq!(resolved.fields.private, Some(true));
}
