// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod http_client;
pub mod scrub;
pub mod traits;
pub mod types;

// ── Service implementations ─────────────────────────────────────────────────
pub mod openai;

pub use http_client::{DEFAULT_REQUEST_TIMEOUT_SECS, build_http_client};
pub use scrub::{sanitize_api_error, scrub_secret_patterns};
pub use traits::CompletionService;
pub use types::{Completion, CompletionRequest};

pub use openai::{DEFAULT_API_URL, OpenAiCompletionService};
