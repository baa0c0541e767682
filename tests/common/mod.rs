use chatvault::conversation::{Conversation, Message};
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[allow(dead_code)]
pub fn fix_bug_conversation() -> Conversation {
    Conversation {
        title: "Fix bug".to_string(),
        messages: vec![
            Message::user("why crash?"),
            Message::assistant("null pointer"),
        ],
        url: "https://chatgpt.com/c/abc".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap(),
    }
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
pub fn conversation_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("conversation.json");
    let body = serde_json::to_string_pretty(&fix_bug_conversation())
        .expect("serialize conversation");
    fs::write(&path, body).expect("failed to write conversation file");
    path
}

/// Mount a chat completions endpoint answering with `summary`
#[allow(dead_code)]
pub async fn mount_summary(server: &MockServer, summary: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": summary },
                "finish_reason": "stop"
            }]
        })))
        .mount(server)
        .await;
}
