pub mod commands;
pub mod repl;

pub use commands::{ChatArgs, Cli, Commands};
pub use repl::{HELP_TEXT, ReplCommand, parse_command};
