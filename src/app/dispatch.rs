use crate::Config;
use crate::cli::{ChatArgs, Cli, Commands, HELP_TEXT, ReplCommand, parse_command};
use crate::llm::OpenAiCompletionService;
use crate::persona::PersonaTable;
use crate::session::{ChatOverrides, Diagnostic, HistoryStore, SessionManager};
use crate::tokenizer::EncodingTokenizer;
use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Text shown after handling one line, and whether the loop should stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub text: String,
    pub quit: bool,
}

impl CommandResult {
    fn show(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }

    fn quit() -> Self {
        Self {
            text: String::new(),
            quit: true,
        }
    }
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Chat(args) => run_chat(config, args).await,
        Commands::Personas => {
            print!("{}", render_personas(&PersonaTable::new()));
            Ok(())
        }
        Commands::Show { file } => {
            let path = resolve_history_path(&config.history_dir(), &file);
            let transcript = HistoryStore::new(&path)
                .load()
                .with_context(|| format!("Failed to read {}", path.display()))?
                .with_context(|| format!("No history file at {}", path.display()))?;
            for message in transcript.turns() {
                println!("{}: {}", message.role, message.content);
            }
            Ok(())
        }
    }
}

/// Build the session from config plus command-line overrides.
pub fn open_session(config: &Config, args: &ChatArgs) -> Result<SessionManager> {
    let mut session_config = config.session.clone();
    if let Some(model) = &args.model {
        session_config.model.clone_from(model);
    }
    if let Some(budget) = args.budget {
        session_config.token_budget = budget;
    }
    session_config.validate()?;

    let completion = OpenAiCompletionService::with_base_url(
        config.api_key.as_deref(),
        &config.api_url,
        config.request_timeout_secs,
    );
    let history_file = args.history_file.as_deref().or(config.history.file.as_deref());

    let mut manager = SessionManager::open(
        session_config,
        &config.history_dir(),
        history_file,
        Arc::new(EncodingTokenizer::new()),
        Arc::new(completion),
    );

    if let Some(text) = &args.custom {
        manager.set_custom_system_message(text)?;
    } else if let Some(name) = &args.persona {
        manager.set_persona(name)?;
    }

    Ok(manager)
}

async fn run_chat(config: Config, args: ChatArgs) -> Result<()> {
    let mut manager = open_session(&config, &args)?;
    // Construction diagnostics were already logged.
    manager.take_diagnostics();

    let mut overrides = ChatOverrides {
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        model: None,
    };

    if let Some(message) = args.message {
        let Some(reply) = manager.chat_completion(&message, overrides).await else {
            bail!("{}", last_failure(&mut manager));
        };
        println!("{}", failure_note(&mut manager, &reply));
        return Ok(());
    }

    println!(
        "parley: chatting as {} (history: {}). /help for commands.",
        persona_label(&manager),
        manager.history_path().display()
    );

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let result = handle_command(&mut manager, &mut overrides, parse_command(&line)).await;
        if !result.text.is_empty() {
            println!("{}", result.text);
        }
        if result.quit {
            break;
        }
    }

    Ok(())
}

/// Apply one parsed line to the session.
pub async fn handle_command(
    manager: &mut SessionManager,
    overrides: &mut ChatOverrides,
    command: ReplCommand,
) -> CommandResult {
    match command {
        ReplCommand::Empty => CommandResult::show(""),
        ReplCommand::Quit => CommandResult::quit(),
        ReplCommand::Help => CommandResult::show(HELP_TEXT),
        ReplCommand::Invalid(message) => CommandResult::show(message),
        ReplCommand::Prompt(prompt) => {
            match manager.chat_completion(&prompt, overrides.clone()).await {
                Some(reply) => CommandResult::show(failure_note(manager, &reply)),
                None => CommandResult::show(format!("error: {}", last_failure(manager))),
            }
        }
        ReplCommand::Persona(name) => match manager.set_persona(&name) {
            Ok(()) => CommandResult::show(format!("persona: {name}")),
            Err(error) => CommandResult::show(format!("error: {error}")),
        },
        ReplCommand::Custom(text) => match manager.set_custom_system_message(&text) {
            Ok(()) => CommandResult::show("persona: custom"),
            Err(error) => CommandResult::show(format!("error: {error}")),
        },
        ReplCommand::Reset => {
            manager.reset_conversation_history();
            CommandResult::show(failure_note(manager, "conversation reset"))
        }
        ReplCommand::Tokens => CommandResult::show(format!(
            "{} / {} tokens across {} messages",
            manager.total_tokens_used(),
            manager.config().token_budget,
            manager.transcript().len()
        )),
        ReplCommand::Temperature(value) => {
            overrides.temperature = Some(value);
            CommandResult::show(format!("temperature: {value}"))
        }
        ReplCommand::MaxTokens(value) => {
            overrides.max_tokens = Some(value);
            CommandResult::show(format!("max tokens: {value}"))
        }
        ReplCommand::History => CommandResult::show(
            manager
                .transcript()
                .turns()
                .map(|m| format!("{}: {}", m.role, m.content))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
    }
}

pub fn render_personas(table: &PersonaTable) -> String {
    table
        .entries()
        .map(|(persona, text)| format!("{persona}\n    {text}\n"))
        .collect()
}

/// Relative names that do not exist on their own resolve under `history_dir`.
fn resolve_history_path(history_dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() || file.exists() {
        file.to_path_buf()
    } else {
        history_dir.join(file)
    }
}

fn persona_label(manager: &SessionManager) -> String {
    manager
        .active_persona()
        .map_or_else(|| "stored system message".to_string(), |p| p.to_string())
}

fn last_failure(manager: &mut SessionManager) -> String {
    manager
        .take_diagnostics()
        .into_iter()
        .rev()
        .find(|d| matches!(d, Diagnostic::CompletionFailed { .. }))
        .map_or_else(|| "no response".to_string(), |d| d.to_string())
}

/// `text`, followed by any save failure recorded while producing it.
fn failure_note(manager: &mut SessionManager, text: &str) -> String {
    let failures: Vec<String> = manager
        .take_diagnostics()
        .iter()
        .filter(|d| matches!(d, Diagnostic::PersistFailed { .. }))
        .map(|d| format!("warning: {d}"))
        .collect();
    if failures.is_empty() {
        text.to_string()
    } else {
        format!("{text}\n{}", failures.join("\n"))
    }
}
