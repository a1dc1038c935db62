mod types;

use self::types::{ChatRequest, ChatResponse, WireMessage};
use super::http_client::{DEFAULT_REQUEST_TIMEOUT_SECS, build_http_client};
use super::scrub::sanitize_api_error;
use super::traits::CompletionService;
use super::types::{Completion, CompletionRequest};
use crate::error::CompletionError;
use anyhow::Context;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::pin::Pin;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "OpenAI";

/// Chat-completions client for OpenAI and API-compatible endpoints.
pub struct OpenAiCompletionService {
    base_url: String,
    /// Pre-computed `"Bearer <key>"` header value (avoids `format!` per request).
    cached_auth_header: Option<String>,
    client: Client,
}

impl OpenAiCompletionService {
    pub fn new(api_key: Option<&str>) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    pub fn with_base_url(api_key: Option<&str>, base_url: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cached_auth_header: api_key
                .filter(|k| !k.trim().is_empty())
                .map(|k| format!("Bearer {k}")),
            client: build_http_client(timeout_secs),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request<'a>(request: &CompletionRequest<'a>) -> ChatRequest<'a> {
        ChatRequest {
            model: request.model,
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn status_error(status: StatusCode, body: &str) -> CompletionError {
        let message = format!("({status}) {}", sanitize_api_error(body));
        let provider = PROVIDER.to_string();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                CompletionError::Auth { provider, message }
            }
            StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited { provider, message },
            _ => CompletionError::Request { provider, message },
        }
    }

    fn extract_completion(chat_response: ChatResponse) -> Result<Completion, CompletionError> {
        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::MalformedResponse {
                provider: PROVIDER.to_string(),
                message: "response carried no message content".into(),
            })?;

        let mut completion = match chat_response.usage {
            Some(usage) => Completion::with_usage(text, usage.prompt_tokens, usage.completion_tokens),
            None => Completion::text_only(text),
        };
        if let Some(model) = chat_response.model {
            completion = completion.with_model(model);
        }
        Ok(completion)
    }

    async fn call_api(&self, request: &ChatRequest<'_>) -> anyhow::Result<ChatResponse> {
        let auth_header =
            self.cached_auth_header
                .as_ref()
                .ok_or_else(|| CompletionError::MissingApiKey {
                    provider: PROVIDER.to_string(),
                })?;

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", auth_header)
            .json(request)
            .send()
            .await
            .map_err(|error| CompletionError::Request {
                provider: PROVIDER.to_string(),
                message: sanitize_api_error(&error.to_string()),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
            return Err(Self::status_error(status, &body).into());
        }

        let body = response
            .text()
            .await
            .context("OpenAI response body read failed")?;
        serde_json::from_str(&body).map_err(|error| {
            CompletionError::MalformedResponse {
                provider: PROVIDER.to_string(),
                message: error.to_string(),
            }
            .into()
        })
    }
}

impl CompletionService for OpenAiCompletionService {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Completion>> + Send + 'a>> {
        Box::pin(async move {
            let chat_request = Self::build_request(&request);
            tracing::debug!(
                model = request.model,
                messages = request.messages.len(),
                max_tokens = request.max_tokens,
                "sending chat completion"
            );
            let chat_response = self.call_api(&chat_request).await?;
            Ok(Self::extract_completion(chat_response)?)
        })
    }
}
