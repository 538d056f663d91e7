//! Token counting under a fixed tokenization scheme.

use crate::error::{IngestError, IngestResult};
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Counts tokens in text. Implementations must be pure.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize;

    /// Name of the tokenization scheme, so consumers can check they agree.
    fn scheme(&self) -> &'static str;
}

/// OpenAI `cl100k_base` byte-pair encoding.
pub struct Cl100kCounter {
    bpe: CoreBPE,
}

impl Cl100kCounter {
    pub const SCHEME: &'static str = "cl100k_base";

    pub fn new() -> IngestResult<Self> {
        let bpe = cl100k_base().map_err(|e| IngestError::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for Cl100kCounter {
    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn scheme(&self) -> &'static str {
        Self::SCHEME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_are_stable() {
        let counter = Cl100kCounter::new().unwrap();
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("hello world"), 2);
        assert_eq!(counter.count("hello world"), counter.count("hello world"));
        assert_eq!(counter.scheme(), "cl100k_base");
    }

    #[test]
    fn test_repeated_words_scale_linearly() {
        let counter = Cl100kCounter::new().unwrap();
        let text = " word".repeat(100);
        assert_eq!(counter.count(&text), 100);
    }
}
