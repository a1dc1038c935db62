use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Named system prompts. `Custom` is the only entry users may rewrite.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Persona {
    #[default]
    NormalAssistant,
    SassyAssistant,
    AngryAssistant,
    ThoughtfulAssistant,
    Custom,
}

impl Persona {
    pub fn builtin_text(self) -> &'static str {
        match self {
            Self::NormalAssistant => {
                "You are a normal, cooperative assistant that does what they are told."
            }
            Self::SassyAssistant => {
                "You are a sassy assistant that is fed up with answering questions."
            }
            Self::AngryAssistant => "You are an angry assistant that likes yelling in all caps.",
            Self::ThoughtfulAssistant => {
                "You are a thoughtful assistant, always ready to dig deeper. You ask clarifying \
questions to ensure understanding and approach problems with a step-by-step methodology."
            }
            Self::Custom => "Enter your custom system message here.",
        }
    }

    pub fn all_keys() -> Vec<String> {
        Self::iter().map(|p| p.as_ref().to_string()).collect()
    }
}

/// Persona key → system prompt text.
#[derive(Debug, Clone)]
pub struct PersonaTable {
    custom: String,
}

impl PersonaTable {
    pub fn new() -> Self {
        Self {
            custom: Persona::Custom.builtin_text().to_string(),
        }
    }

    /// Parse a persona key, rejecting anything outside the catalog.
    pub fn resolve(name: &str) -> Result<Persona, SessionError> {
        name.parse::<Persona>()
            .map_err(|_| SessionError::UnknownPersona {
                name: name.to_string(),
                available: Persona::all_keys(),
            })
    }

    pub fn text(&self, persona: Persona) -> &str {
        match persona {
            Persona::Custom => &self.custom,
            builtin => builtin.builtin_text(),
        }
    }

    pub fn get(&self, name: &str) -> Result<&str, SessionError> {
        Ok(self.text(Self::resolve(name)?))
    }

    /// Overwrite the custom entry. Blank text is rejected and leaves the
    /// table unchanged.
    pub fn set_custom(&mut self, text: &str) -> Result<(), SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::InvalidArgument(
                "custom message cannot be empty".into(),
            ));
        }
        text.clone_into(&mut self.custom);
        Ok(())
    }

    /// All entries in catalog order.
    pub fn entries(&self) -> impl Iterator<Item = (Persona, &str)> {
        Persona::iter().map(move |p| (p, self.text(p)))
    }

    /// The first persona whose current text equals `text`.
    pub fn find_by_text(&self, text: &str) -> Option<Persona> {
        self.entries()
            .find(|(_, entry)| *entry == text)
            .map(|(persona, _)| persona)
    }
}

impl Default for PersonaTable {
    fn default() -> Self {
        Self::new()
    }
}
