use std::fs;

use parley::session::FreshReason;
use parley::{ChatOverrides, Diagnostic, Persona};
use serde_json::json;
use tempfile::TempDir;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{HISTORY_FILE, manager_against, reply_body, session_config};

#[tokio::test]
async fn resumed_session_continues_stored_conversation() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Arr.")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    {
        let mut first = manager_against(&server.uri(), dir.path(), session_config(4096));
        first.set_persona("sassy_assistant").unwrap();
        assert!(
            first
                .chat_completion("hello", ChatOverrides::default())
                .await
                .is_some()
        );
    }

    let resumed = manager_against(&server.uri(), dir.path(), session_config(4096));
    assert_eq!(resumed.active_persona(), Some(Persona::SassyAssistant));
    assert_eq!(
        resumed.active_system_message(),
        Persona::SassyAssistant.builtin_text()
    );
    assert_eq!(resumed.transcript().len(), 3);
}

#[test]
fn corrupt_history_starts_fresh_with_diagnostic() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(HISTORY_FILE), "{ not json").unwrap();

    let manager = manager_against("http://127.0.0.1:9", dir.path(), session_config(4096));

    assert_eq!(manager.transcript().len(), 1);
    assert_eq!(
        manager.active_system_message(),
        Persona::NormalAssistant.builtin_text()
    );
    assert!(manager.diagnostics().iter().any(|d| matches!(
        d,
        Diagnostic::FreshTranscript {
            reason: FreshReason::Malformed(_),
            ..
        }
    )));
}

#[test]
fn stored_custom_system_message_is_kept() {
    let dir = TempDir::new().unwrap();
    let stored = json!([
        {"role": "system", "content": "You only speak in haiku."},
        {"role": "user", "content": "hi"},
        {"role": "assistant", "content": "greetings, small friend"}
    ]);
    fs::write(dir.path().join(HISTORY_FILE), stored.to_string()).unwrap();

    let manager = manager_against("http://127.0.0.1:9", dir.path(), session_config(4096));

    assert_eq!(manager.active_system_message(), "You only speak in haiku.");
    assert_eq!(manager.active_persona(), None);
    assert_eq!(manager.transcript().len(), 3);
}

#[test]
fn reset_rewrites_file_with_only_the_system_message() {
    let dir = TempDir::new().unwrap();
    let stored = json!([
        {"role": "system", "content": Persona::AngryAssistant.builtin_text()},
        {"role": "user", "content": "hi"}
    ]);
    fs::write(dir.path().join(HISTORY_FILE), stored.to_string()).unwrap();

    let mut manager = manager_against("http://127.0.0.1:9", dir.path(), session_config(4096));
    manager.reset_conversation_history();

    assert_eq!(
        crate::support::read_history(dir.path()),
        json!([{"role": "system", "content": Persona::AngryAssistant.builtin_text()}])
    );
}
