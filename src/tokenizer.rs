//! Token counting.
//!
//! The session manager only needs "how many tokens is this text for this
//! model". [`EncodingTokenizer`] answers with the model's BPE encoding from
//! `tiktoken-rs`; tests swap in simpler counters behind [`Tokenizer`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tiktoken_rs::CoreBPE;

/// Model whose encoding is used when the requested model is unknown.
pub const DEFAULT_TOKENIZER_MODEL: &str = "gpt-3.5-turbo";

/// Maps text to a token count for a model identifier.
pub trait Tokenizer: Send + Sync {
    /// Whether `model` has a known encoding.
    fn recognizes(&self, model: &str) -> bool;

    /// Count tokens in `text`. Unknown models fall back to the default
    /// model's encoding instead of failing.
    fn count(&self, text: &str, model: &str) -> usize;
}

/// BPE token counter. Encodings are built on first use and cached per model.
#[derive(Default)]
pub struct EncodingTokenizer {
    encodings: Mutex<HashMap<String, Option<Arc<CoreBPE>>>>,
}

impl EncodingTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn bpe_for(&self, model: &str) -> Option<Arc<CoreBPE>> {
        let mut encodings = self.encodings.lock().unwrap_or_else(PoisonError::into_inner);
        encodings
            .entry(model.to_string())
            .or_insert_with(|| tiktoken_rs::get_bpe_from_model(model).ok().map(Arc::new))
            .clone()
    }

    fn default_bpe(&self) -> Option<Arc<CoreBPE>> {
        self.bpe_for(DEFAULT_TOKENIZER_MODEL).or_else(|| {
            let bpe = tiktoken_rs::cl100k_base().ok().map(Arc::new);
            if bpe.is_none() {
                tracing::warn!("cl100k_base encoding unavailable; counting characters");
            }
            bpe
        })
    }
}

impl Tokenizer for EncodingTokenizer {
    fn recognizes(&self, model: &str) -> bool {
        self.bpe_for(model.trim()).is_some()
    }

    fn count(&self, text: &str, model: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self.bpe_for(model.trim()).or_else(|| self.default_bpe()) {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => text.chars().count().div_ceil(4),
        }
    }
}
