use std::path::Path;
use std::sync::Arc;

use parley::llm::OpenAiCompletionService;
use parley::session::HistoryStore;
use parley::{EncodingTokenizer, SessionConfig, SessionManager};
use serde_json::{Value, json};

pub const HISTORY_FILE: &str = "conversation_history_010124_090000.json";

pub fn session_config(token_budget: usize) -> SessionConfig {
    SessionConfig {
        token_budget,
        ..SessionConfig::default()
    }
}

pub fn manager_against(server_uri: &str, dir: &Path, config: SessionConfig) -> SessionManager {
    let service = OpenAiCompletionService::with_base_url(Some("sk-test"), server_uri, 5);
    SessionManager::new(
        config,
        HistoryStore::new(dir.join(HISTORY_FILE)),
        Arc::new(EncodingTokenizer::new()),
        Arc::new(service),
    )
}

pub fn reply_body(text: &str) -> Value {
    json!({
        "model": "gpt-3.5-turbo",
        "choices": [{"message": {"role": "assistant", "content": text}}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3}
    })
}

pub fn read_history(dir: &Path) -> Value {
    let raw = std::fs::read_to_string(dir.join(HISTORY_FILE)).unwrap();
    serde_json::from_str(&raw).unwrap()
}
