use std::path::PathBuf;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `Parley`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum ParleyError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Session / Persona ───────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Storage ─────────────────────────────────────────────────────────
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    // ── Completion service ──────────────────────────────────────────────
    #[error("completion: {0}")]
    Completion(#[from] CompletionError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Session errors ─────────────────────────────────────────────────────────

/// Caller mistakes. Raised synchronously; the transcript is left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unknown persona: {name}. Available personas are: {}", available.join(", "))]
    UnknownPersona {
        name: String,
        available: Vec<String>,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

// ─── Storage errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed creating history directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed history file {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid transcript in {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

// ─── Completion service errors ──────────────────────────────────────────────

/// Failures of the remote completion call. The session manager does not
/// distinguish between these; they exist for logs and for service callers.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("{provider} API key not set. Set PARLEY_API_KEY or edit config.toml.")]
    MissingApiKey { provider: String },

    #[error("provider {provider} authentication failed: {message}")]
    Auth { provider: String, message: String },

    #[error("provider {provider} rate-limited: {message}")]
    RateLimited { provider: String, message: String },

    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("malformed response from {provider}: {message}")]
    MalformedResponse { provider: String, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ParleyError>;
