use std::fmt;
use std::path::PathBuf;

/// Why a session started from a fresh transcript instead of stored history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshReason {
    Missing,
    Unreadable(String),
    Malformed(String),
}

/// A fail-soft event. Environment failures never reach the caller as errors;
/// they are recorded here and logged through `tracing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    FreshTranscript { path: PathBuf, reason: FreshReason },
    HistoryDirUnavailable { path: PathBuf, message: String },
    TokenizerFallback { requested: String, fallback: String },
    CompletionFailed { model: String, message: String },
    PersistFailed { path: PathBuf, message: String },
}

impl Diagnostic {
    /// Emit this event through `tracing` at the level it deserves.
    pub(crate) fn log(&self) {
        match self {
            Self::FreshTranscript {
                path,
                reason: FreshReason::Missing,
            } => {
                tracing::info!(path = %path.display(), "no stored history; starting fresh transcript");
            }
            Self::FreshTranscript { path, reason } => {
                tracing::warn!(path = %path.display(), reason = ?reason, "stored history unusable; starting fresh transcript");
            }
            Self::HistoryDirUnavailable { path, message } => {
                tracing::warn!(path = %path.display(), error = %message, "history directory unavailable");
            }
            Self::TokenizerFallback {
                requested,
                fallback,
            } => {
                tracing::warn!(requested = %requested, fallback = %fallback, "model unknown to tokenizer; using fallback encoding");
            }
            Self::CompletionFailed { model, message } => {
                tracing::warn!(model = %model, error = %message, "completion failed");
            }
            Self::PersistFailed { path, message } => {
                tracing::warn!(path = %path.display(), error = %message, "failed to persist transcript");
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FreshTranscript { path, reason } => match reason {
                FreshReason::Missing => {
                    write!(f, "no history at {}; started fresh", path.display())
                }
                FreshReason::Unreadable(msg) | FreshReason::Malformed(msg) => {
                    write!(f, "ignored history at {}: {msg}", path.display())
                }
            },
            Self::HistoryDirUnavailable { path, message } => {
                write!(f, "history directory {} unavailable: {message}", path.display())
            }
            Self::TokenizerFallback {
                requested,
                fallback,
            } => write!(
                f,
                "model '{requested}' not known to tokenizer; counting with '{fallback}'"
            ),
            Self::CompletionFailed { message, .. } => {
                write!(f, "an error occurred while generating a response: {message}")
            }
            Self::PersistFailed { path, message } => {
                write!(f, "could not save history to {}: {message}", path.display())
            }
        }
    }
}
