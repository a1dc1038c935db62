use super::message::{Message, Role};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("transcript is empty")]
    Empty,

    #[error("system message at index {index}; only index 0 may hold one")]
    MisplacedSystem { index: usize },
}

/// Ordered conversation state.
///
/// Holds at most one system message, always at index 0, and is never empty
/// once built. Only the session manager mutates it, so the mutating methods
/// are crate-private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// A transcript holding only the given system prompt.
    pub fn seeded(system_text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_text)],
        }
    }

    /// Validate a message sequence read from storage.
    ///
    /// A missing leading system message is allowed here; the session manager
    /// inserts one during reconciliation.
    pub fn from_messages(messages: Vec<Message>) -> Result<Self, TranscriptError> {
        if messages.is_empty() {
            return Err(TranscriptError::Empty);
        }
        if let Some(index) = messages
            .iter()
            .enumerate()
            .skip(1)
            .find_map(|(i, m)| m.is_system().then_some(i))
        {
            return Err(TranscriptError::MisplacedSystem { index });
        }
        Ok(Self { messages })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The system prompt, when index 0 holds one.
    pub fn system_message(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.is_system())
            .map(|m| m.content.as_str())
    }

    /// Non-system turns in chronological order.
    pub fn turns(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| !m.is_system())
    }

    /// Overwrite the system slot, or insert one at the front when absent.
    pub(crate) fn set_system(&mut self, text: &str) {
        match self.messages.first_mut() {
            Some(first) if first.role == Role::System => {
                first.content.clear();
                first.content.push_str(text);
            }
            _ => self.messages.insert(0, Message::system(text)),
        }
    }

    pub(crate) fn push(&mut self, message: Message) {
        debug_assert!(!message.is_system(), "system slot is managed by set_system");
        self.messages.push(message);
    }

    /// Drop the oldest message after index 0. Returns `None` when only one
    /// message remains.
    pub(crate) fn evict_oldest_turn(&mut self) -> Option<Message> {
        if self.messages.len() > 1 {
            Some(self.messages.remove(1))
        } else {
            None
        }
    }
}
