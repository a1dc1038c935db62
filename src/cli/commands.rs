use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// `Parley` - persona-aware chat sessions against LLM completion APIs.
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author = "theonlyhennygod")]
#[command(version = "0.1.0")]
#[command(about = "Chat with a language model, one persona at a time.", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start or resume a conversation
    Chat(ChatArgs),

    /// List the persona catalog
    Personas,

    /// Print the visible turns of a stored transcript
    Show {
        /// History file (absolute, or relative to the history folder)
        file: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct ChatArgs {
    /// Single message mode (don't enter interactive mode)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Persona key to start with (see `parley personas`)
    #[arg(short, long)]
    pub persona: Option<String>,

    /// Custom system message; selects the `custom` persona
    #[arg(long, conflicts_with = "persona")]
    pub custom: Option<String>,

    /// Resume this history file instead of starting a new one
    #[arg(long)]
    pub history_file: Option<String>,

    /// Model to use
    #[arg(long)]
    pub model: Option<String>,

    /// Temperature for each reply (0.0 - 1.0)
    #[arg(short, long, value_parser = parse_temperature)]
    pub temperature: Option<f64>,

    /// Maximum tokens per reply
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_tokens: Option<u32>,

    /// Token budget for the whole transcript
    #[arg(long, value_parser = parse_budget)]
    pub budget: Option<usize>,
}

pub fn parse_temperature(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("temperature must be within [0, 1], got {value}"))
    }
}

fn parse_budget(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err("budget must be greater than 0".into()),
        Ok(value) => Ok(value),
        Err(_) => Err(format!("'{raw}' is not a positive integer")),
    }
}
