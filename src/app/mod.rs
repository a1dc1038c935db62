pub mod dispatch;

pub use dispatch::{CommandResult, dispatch, handle_command, open_session};
