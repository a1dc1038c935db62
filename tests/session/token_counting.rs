use parley::{EncodingTokenizer, Tokenizer};
use tempfile::TempDir;

use crate::support::{manager_against, session_config};

#[test]
fn encoding_tokenizer_counts_through_the_trait() {
    let tokenizer: Box<dyn Tokenizer> = Box::new(EncodingTokenizer::new());
    assert_eq!(tokenizer.count("hello world", "gpt-3.5-turbo"), 2);
    assert_eq!(tokenizer.count("", "gpt-4o"), 0);
}

#[test]
fn session_total_matches_per_message_counts() {
    let dir = TempDir::new().unwrap();
    let manager = manager_against("http://127.0.0.1:9", dir.path(), session_config(4096));

    let tokenizer = EncodingTokenizer::new();
    let system = manager.active_system_message().to_string();
    assert_eq!(
        manager.total_tokens_used(),
        tokenizer.count(&system, "gpt-3.5-turbo")
    );
    assert!(manager.total_tokens_used() > 0);
}
