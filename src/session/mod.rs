pub mod diagnostics;
pub mod manager;
pub mod message;
pub mod store;
pub mod transcript;

pub use diagnostics::{Diagnostic, FreshReason};
pub use manager::{BudgetOutcome, ChatOverrides, SessionManager};
pub use message::{Message, Role};
pub use store::{HistoryStore, default_file_name};
pub use transcript::{Transcript, TranscriptError};
