mod common;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use chatvault::config::SummarizerConfig;
use chatvault::summarizer::{ChatCompletionSummarizer, Summarizer, SummaryError};

fn summarizer_for(server: &MockServer) -> ChatCompletionSummarizer {
    ChatCompletionSummarizer::new(SummarizerConfig {
        api_base: server.uri(),
        ..SummarizerConfig::default()
    })
}

/// The request carries the bearer token, model, both messages and temperature
#[tokio::test]
async fn test_summarize_sends_expected_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer secret-key"))
        .and(body_partial_json(json!({ "model": "glm-4-plus" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "## 对话主题\n修复崩溃" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let summary = summarizer_for(&server)
        .summarize(&common::fix_bug_conversation(), "secret-key")
        .await
        .expect("summary");
    assert_eq!(summary, "## 对话主题\n修复崩溃");

    let requests: Vec<Request> = server.received_requests().await.expect("recorded requests");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("json body");
    let messages = body["messages"].as_array().expect("messages");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[1]["role"], "user");
    assert!(messages[1]["content"]
        .as_str()
        .unwrap()
        .contains("我: why crash?\n\nChatGPT: null pointer"));
    assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    assert!(body.get("max_tokens").is_none());
}

/// Non-2xx responses surface the upstream `error.message`
#[tokio::test]
async fn test_summarize_surfaces_upstream_error_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": "1000", "message": "身份验证失败。" }
        })))
        .mount(&server)
        .await;

    let err = summarizer_for(&server)
        .summarize(&common::fix_bug_conversation(), "bad-key")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SummaryError::Remote {
            status: 401,
            message: "身份验证失败。".to_string()
        }
    );
}

/// Without an error body the status reason is used
#[tokio::test]
async fn test_summarize_error_without_body_uses_status_reason() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let err = summarizer_for(&server)
        .summarize(&common::fix_bug_conversation(), "k")
        .await
        .unwrap_err();
    assert_eq!(err.upstream_message(), "Internal Server Error");
}

/// An empty choice list is a remote error, not an empty summary
#[tokio::test]
async fn test_summarize_without_choices_is_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = summarizer_for(&server)
        .summarize(&common::fix_bug_conversation(), "k")
        .await
        .unwrap_err();
    assert!(matches!(err, SummaryError::Remote { status: 200, .. }));
}

/// Unreachable endpoints are network errors
#[tokio::test]
async fn test_summarize_unreachable_is_network_error() {
    let summarizer = ChatCompletionSummarizer::new(SummarizerConfig {
        api_base: "http://127.0.0.1:1".to_string(),
        ..SummarizerConfig::default()
    });
    let err = summarizer
        .summarize(&common::fix_bug_conversation(), "k")
        .await
        .unwrap_err();
    assert!(matches!(err, SummaryError::Network(_)));
}

/// The connection check sends a tiny request with a token cap
#[tokio::test]
async fn test_check_connection_sends_small_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "max_tokens": 10,
            "messages": [{ "role": "user", "content": "你好" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "你好！" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    summarizer_for(&server)
        .check_connection("k")
        .await
        .expect("connection check");
}
