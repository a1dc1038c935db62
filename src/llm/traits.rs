use super::types::{Completion, CompletionRequest};
use std::future::Future;
use std::pin::Pin;

/// Remote model that turns a transcript into one reply.
///
/// Implementations own their timeout and retry policy. Any failure, whether
/// network, auth, quota or a malformed body, is reported as an `Err`.
pub trait CompletionService: Send + Sync {
    /// Service identifier (e.g. "openai").
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Completion>> + Send + 'a>>;
}
