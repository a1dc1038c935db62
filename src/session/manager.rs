use super::diagnostics::{Diagnostic, FreshReason};
use super::message::Message;
use super::store::HistoryStore;
use super::transcript::Transcript;
use crate::config::SessionConfig;
use crate::error::{SessionError, StorageError};
use crate::llm::{CompletionRequest, CompletionService};
use crate::persona::{Persona, PersonaTable};
use crate::tokenizer::{DEFAULT_TOKENIZER_MODEL, Tokenizer};
use chrono::Local;
use std::path::Path;
use std::sync::Arc;

/// Optional per-request generation parameters. `None` falls back to the
/// session defaults.
#[derive(Debug, Clone, Default)]
pub struct ChatOverrides {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
}

/// What a budget pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetOutcome {
    pub evicted: usize,
    pub total_tokens: usize,
}

/// Owns one conversation: transcript, persona selection, token budget and
/// the history file.
///
/// Calls must be serialized by the caller; nothing here is locked.
pub struct SessionManager {
    config: SessionConfig,
    personas: PersonaTable,
    active_persona: Option<Persona>,
    active_system_message: String,
    transcript: Transcript,
    store: HistoryStore,
    tokenizer: Arc<dyn Tokenizer>,
    tokenizer_model: String,
    completion: Arc<dyn CompletionService>,
    diagnostics: Vec<Diagnostic>,
}

impl SessionManager {
    /// Open a session under `history_dir`, creating the directory if needed.
    ///
    /// `history_file` resumes an existing transcript; without it a
    /// timestamped file name is generated.
    pub fn open(
        config: SessionConfig,
        history_dir: &Path,
        history_file: Option<&str>,
        tokenizer: Arc<dyn Tokenizer>,
        completion: Arc<dyn CompletionService>,
    ) -> Self {
        let store = HistoryStore::in_dir(history_dir, history_file, &Local::now());
        let dir_problem = store
            .ensure_dir()
            .err()
            .map(|error| Diagnostic::HistoryDirUnavailable {
                path: history_dir.to_path_buf(),
                message: error.to_string(),
            });

        let mut manager = Self::new(config, store, tokenizer, completion);
        if let Some(diagnostic) = dir_problem {
            manager.note(diagnostic);
        }
        manager
    }

    /// Build a session around an explicit history store.
    ///
    /// Never fails: an absent, unreadable or malformed history file yields a
    /// fresh transcript seeded with the default persona, plus a diagnostic.
    pub fn new(
        config: SessionConfig,
        store: HistoryStore,
        tokenizer: Arc<dyn Tokenizer>,
        completion: Arc<dyn CompletionService>,
    ) -> Self {
        let personas = PersonaTable::new();
        let default_persona = config.default_persona;
        let default_text = personas.text(default_persona).to_string();
        let mut diagnostics = Vec::new();

        let tokenizer_model = if tokenizer.recognizes(&config.model) {
            config.model.clone()
        } else {
            diagnostics.push(Diagnostic::TokenizerFallback {
                requested: config.model.clone(),
                fallback: DEFAULT_TOKENIZER_MODEL.to_string(),
            });
            DEFAULT_TOKENIZER_MODEL.to_string()
        };

        let loaded = match store.load() {
            Ok(Some(transcript)) => Some(transcript),
            Ok(None) => {
                diagnostics.push(Diagnostic::FreshTranscript {
                    path: store.path().to_path_buf(),
                    reason: FreshReason::Missing,
                });
                None
            }
            Err(error) => {
                let reason = match &error {
                    StorageError::Malformed { .. } | StorageError::Invalid { .. } => {
                        FreshReason::Malformed(error.to_string())
                    }
                    _ => FreshReason::Unreadable(error.to_string()),
                };
                diagnostics.push(Diagnostic::FreshTranscript {
                    path: store.path().to_path_buf(),
                    reason,
                });
                None
            }
        };

        // A stored system message is authoritative; the active persona text
        // is derived from it rather than forced back to the default.
        let (transcript, active_system_message) = match loaded {
            Some(mut transcript) => {
                let active = transcript
                    .system_message()
                    .map_or_else(|| default_text.clone(), str::to_string);
                transcript.set_system(&active);
                (transcript, active)
            }
            None => (Transcript::seeded(default_text.clone()), default_text),
        };
        let active_persona = personas.find_by_text(&active_system_message);

        for diagnostic in &diagnostics {
            diagnostic.log();
        }
        tracing::info!(
            path = %store.path().display(),
            messages = transcript.len(),
            model = %config.model,
            "session opened"
        );

        Self {
            config,
            personas,
            active_persona,
            active_system_message,
            transcript,
            store,
            tokenizer,
            tokenizer_model,
            completion,
            diagnostics,
        }
    }

    // ── Persona ─────────────────────────────────────────────────────────

    /// Switch to the persona named `name` and rewrite the system slot.
    pub fn set_persona(&mut self, name: &str) -> Result<(), SessionError> {
        let persona = PersonaTable::resolve(name)?;
        self.select_persona(persona);
        Ok(())
    }

    pub fn select_persona(&mut self, persona: Persona) {
        self.personas.text(persona).clone_into(&mut self.active_system_message);
        self.active_persona = Some(persona);
        self.sync_system_message();
        tracing::debug!(persona = %persona, "persona selected");
    }

    /// Store `text` as the custom persona and switch to it.
    pub fn set_custom_system_message(&mut self, text: &str) -> Result<(), SessionError> {
        self.personas.set_custom(text)?;
        self.select_persona(Persona::Custom);
        Ok(())
    }

    /// Copy the active persona text into the transcript's system slot,
    /// inserting the slot if it is missing.
    pub fn sync_system_message(&mut self) {
        self.transcript.set_system(&self.active_system_message);
    }

    // ── Token accounting ────────────────────────────────────────────────

    pub fn count_tokens(&self, text: &str) -> usize {
        self.tokenizer.count(text, &self.tokenizer_model)
    }

    /// Recomputed from scratch on every call.
    pub fn total_tokens_used(&self) -> usize {
        self.transcript
            .messages()
            .iter()
            .map(|m| self.count_tokens(&m.content))
            .sum()
    }

    /// Evict the oldest non-system turns until the transcript fits the
    /// budget or only the system message remains.
    pub fn enforce_token_budget(&mut self) -> BudgetOutcome {
        let mut evicted = 0;
        let mut total_tokens = self.total_tokens_used();

        while total_tokens > self.config.token_budget {
            let Some(dropped) = self.transcript.evict_oldest_turn() else {
                break;
            };
            evicted += 1;
            total_tokens -= self.count_tokens(&dropped.content);
        }

        if evicted > 0 {
            tracing::debug!(
                evicted,
                total_tokens,
                budget = self.config.token_budget,
                "evicted turns to fit token budget"
            );
        }

        BudgetOutcome {
            evicted,
            total_tokens,
        }
    }

    // ── Completion cycle ────────────────────────────────────────────────

    /// Run one turn against the completion service.
    ///
    /// The prompt stays in the transcript even when the call fails. On
    /// failure `None` is returned and a [`Diagnostic::CompletionFailed`] is
    /// recorded; on success the reply is appended and the transcript saved.
    pub async fn chat_completion(
        &mut self,
        prompt: &str,
        overrides: ChatOverrides,
    ) -> Option<String> {
        let temperature = overrides.temperature.unwrap_or(self.config.temperature);
        let max_tokens = overrides
            .max_tokens
            .unwrap_or(self.config.max_response_tokens);
        let model = overrides
            .model
            .unwrap_or_else(|| self.config.model.clone());

        self.transcript.push(Message::user(prompt));
        self.enforce_token_budget();

        let request = CompletionRequest {
            messages: self.transcript.messages(),
            model: &model,
            temperature,
            max_tokens,
        };
        let result = self.completion.complete(request).await;

        match result {
            Ok(completion) => {
                tracing::debug!(
                    service = self.completion.name(),
                    input_tokens = ?completion.input_tokens,
                    output_tokens = ?completion.output_tokens,
                    "completion received"
                );
                self.transcript
                    .push(Message::assistant(completion.text.clone()));
                self.persist();
                Some(completion.text)
            }
            Err(error) => {
                self.note(Diagnostic::CompletionFailed {
                    model,
                    message: format!("{error:#}"),
                });
                None
            }
        }
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Write the transcript to the history file. Failures are recorded and
    /// logged, never returned.
    pub fn persist(&mut self) {
        if let Err(error) = self.store.save(&self.transcript) {
            self.note(Diagnostic::PersistFailed {
                path: self.store.path().to_path_buf(),
                message: error.to_string(),
            });
        }
    }

    /// Replace the transcript with only the active system message and save.
    pub fn reset_conversation_history(&mut self) {
        self.transcript = Transcript::seeded(self.active_system_message.clone());
        tracing::info!(path = %self.store.path().display(), "conversation history reset");
        self.persist();
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn active_system_message(&self) -> &str {
        &self.active_system_message
    }

    /// The persona whose text is active, if it matches a catalog entry.
    pub fn active_persona(&self) -> Option<Persona> {
        self.active_persona
    }

    pub fn personas(&self) -> &PersonaTable {
        &self.personas
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn history_path(&self) -> &Path {
        self.store.path()
    }

    /// Model whose encoding is used for token counting.
    pub fn tokenizer_model(&self) -> &str {
        &self.tokenizer_model
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn note(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }
}
