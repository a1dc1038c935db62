use parley::app::handle_command;
use parley::cli::{ReplCommand, parse_command};
use parley::{ChatOverrides, Persona};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{manager_against, reply_body, session_config};

#[tokio::test]
async fn temperature_command_applies_to_following_prompts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({"temperature": 0.25})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("cool")))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut manager = manager_against(&server.uri(), dir.path(), session_config(4096));
    let mut overrides = ChatOverrides::default();

    let set = handle_command(&mut manager, &mut overrides, parse_command("/temp 0.25")).await;
    assert!(!set.quit);
    assert_eq!(overrides.temperature, Some(0.25));

    let reply = handle_command(&mut manager, &mut overrides, parse_command("hello")).await;
    assert_eq!(reply.text, "cool");
}

#[tokio::test]
async fn persona_commands_switch_system_message() {
    let dir = TempDir::new().unwrap();
    let mut manager = manager_against("http://127.0.0.1:9", dir.path(), session_config(4096));
    let mut overrides = ChatOverrides::default();

    handle_command(
        &mut manager,
        &mut overrides,
        parse_command("/persona angry_assistant"),
    )
    .await;
    assert_eq!(manager.active_persona(), Some(Persona::AngryAssistant));
    assert_eq!(
        manager.transcript().messages()[0].content,
        Persona::AngryAssistant.builtin_text()
    );

    let unknown = handle_command(
        &mut manager,
        &mut overrides,
        ReplCommand::Persona("grumpy".into()),
    )
    .await;
    assert!(unknown.text.starts_with("error:"));
    assert_eq!(manager.active_persona(), Some(Persona::AngryAssistant));

    handle_command(
        &mut manager,
        &mut overrides,
        parse_command("/custom You are a lighthouse keeper."),
    )
    .await;
    assert_eq!(manager.active_persona(), Some(Persona::Custom));
    assert_eq!(manager.active_system_message(), "You are a lighthouse keeper.");
}

#[tokio::test]
async fn quit_stops_the_loop() {
    let dir = TempDir::new().unwrap();
    let mut manager = manager_against("http://127.0.0.1:9", dir.path(), session_config(4096));
    let result = handle_command(&mut manager, &mut ChatOverrides::default(), ReplCommand::Quit).await;
    assert!(result.quit);
}

#[tokio::test]
async fn save_failures_are_reported_with_each_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("still here")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    // A directory in place of the history file makes every save fail.
    std::fs::create_dir(dir.path().join(crate::support::HISTORY_FILE)).unwrap();
    let mut manager = manager_against(&server.uri(), dir.path(), session_config(4096));
    manager.take_diagnostics();
    let mut overrides = ChatOverrides::default();

    for prompt in ["one", "two"] {
        let result = handle_command(&mut manager, &mut overrides, parse_command(prompt)).await;
        let mut lines = result.text.lines();
        assert_eq!(lines.next(), Some("still here"));
        assert!(lines.next().is_some_and(|l| l.starts_with("warning:")));
        assert!(manager.diagnostics().is_empty());
    }
}

#[tokio::test]
async fn prompt_whitespace_reaches_the_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("ok")))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut manager = manager_against(&server.uri(), dir.path(), session_config(4096));

    handle_command(
        &mut manager,
        &mut ChatOverrides::default(),
        parse_command("  indented\t"),
    )
    .await;

    assert_eq!(manager.transcript().messages()[1].content, "  indented\t");
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(body["messages"][1]["content"], "  indented\t");
}
