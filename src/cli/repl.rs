use super::commands::parse_temperature;

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Prompt(String),
    Persona(String),
    Custom(String),
    Reset,
    Tokens,
    Temperature(f64),
    MaxTokens(u32),
    History,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

pub const HELP_TEXT: &str = "\
/persona <key>   switch persona (see `parley personas`)
/custom <text>   set and switch to a custom persona
/reset           clear the conversation, keeping the persona
/tokens          show transcript token usage against the budget
/temp <0..1>     temperature for following replies
/max <n>         max tokens for following replies
/history         print the conversation so far
/help            show this help
/quit, /exit     leave";

/// Whitespace only decides between command, prompt and blank; a prompt is
/// forwarded exactly as typed.
pub fn parse_command(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return ReplCommand::Prompt(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "quit" | "exit" => ReplCommand::Quit,
        "help" => ReplCommand::Help,
        "reset" => ReplCommand::Reset,
        "tokens" => ReplCommand::Tokens,
        "history" => ReplCommand::History,
        "persona" if !arg.is_empty() => ReplCommand::Persona(arg.to_string()),
        "persona" => ReplCommand::Invalid("usage: /persona <key>".into()),
        // Blank custom text is passed through so the session can reject it.
        "custom" => ReplCommand::Custom(arg.to_string()),
        "temp" => match parse_temperature(arg) {
            Ok(value) => ReplCommand::Temperature(value),
            Err(message) => ReplCommand::Invalid(message),
        },
        "max" => match arg.parse::<u32>() {
            Ok(value) if value > 0 => ReplCommand::MaxTokens(value),
            _ => ReplCommand::Invalid("usage: /max <positive integer>".into()),
        },
        other => ReplCommand::Invalid(format!("unknown command /{other}; try /help")),
    }
}
