use parley::session::Role;
use parley::{ChatOverrides, Diagnostic, Persona};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{manager_against, read_history, reply_body, session_config};

#[tokio::test]
async fn successful_turn_sends_transcript_and_persists_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "messages": [
                {"role": "system", "content": Persona::NormalAssistant.builtin_text()},
                {"role": "user", "content": "What is Rust?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("A language.")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut manager = manager_against(&server.uri(), dir.path(), session_config(4096));

    let reply = manager
        .chat_completion("What is Rust?", ChatOverrides::default())
        .await;

    assert_eq!(reply.as_deref(), Some("A language."));
    let stored = read_history(dir.path());
    assert_eq!(
        stored,
        json!([
            {"role": "system", "content": Persona::NormalAssistant.builtin_text()},
            {"role": "user", "content": "What is Rust?"},
            {"role": "assistant", "content": "A language."}
        ])
    );
}

#[tokio::test]
async fn overrides_reach_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"temperature": 0.1, "max_tokens": 20})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut manager = manager_against(&server.uri(), dir.path(), session_config(4096));
    let overrides = ChatOverrides {
        temperature: Some(0.1),
        max_tokens: Some(20),
        model: None,
    };

    assert_eq!(
        manager.chat_completion("hi", overrides).await.as_deref(),
        Some("ok")
    );
}

#[tokio::test]
async fn server_error_keeps_user_turn_and_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut manager = manager_against(&server.uri(), dir.path(), session_config(4096));
    manager.take_diagnostics();

    let reply = manager
        .chat_completion("anyone there?", ChatOverrides::default())
        .await;

    assert!(reply.is_none());
    let last = manager.transcript().last().unwrap();
    assert_eq!(last.role, Role::User);
    assert_eq!(last.content, "anyone there?");
    assert!(
        manager
            .take_diagnostics()
            .iter()
            .any(|d| matches!(d, Diagnostic::CompletionFailed { .. }))
    );
    // Failed turns are not written out.
    assert!(!dir.path().join(crate::support::HISTORY_FILE).exists());
}

#[tokio::test]
async fn oldest_turns_are_evicted_before_the_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("fine")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut manager = manager_against(&server.uri(), dir.path(), session_config(4096));
    manager.set_custom_system_message("Be brief.").unwrap();

    for prompt in ["first question here", "second question here"] {
        assert!(
            manager
                .chat_completion(prompt, ChatOverrides::default())
                .await
                .is_some()
        );
    }

    // Shrink the budget so only the system slot plus the newest turns fit.
    let system_tokens = manager.count_tokens("Be brief.");
    let new_prompt = "third";
    let budget = system_tokens + manager.count_tokens(new_prompt) + manager.count_tokens("fine");
    let mut manager = {
        let mut config = manager.config().clone();
        config.token_budget = budget;
        manager_against(&server.uri(), dir.path(), config)
    };

    let reply = manager
        .chat_completion(new_prompt, ChatOverrides::default())
        .await;

    assert_eq!(reply.as_deref(), Some("fine"));
    let contents: Vec<&str> = manager
        .transcript()
        .messages()
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, ["Be brief.", "fine", "third", "fine"]);
}
