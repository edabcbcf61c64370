//! Whitespace normalization and token-window chunking.
//!
//! Text is split on the same cl100k_base vocabulary the embedding models
//! assume, so chunk boundaries line up with what the model actually sees.

use crate::error::{KorpusError, Result};
use std::sync::LazyLock;
use tiktoken_rs::CoreBPE;

static TOKENIZER: LazyLock<CoreBPE> = LazyLock::new(|| {
    tiktoken_rs::cl100k_base().expect("Failed to initialize cl100k_base tokenizer")
});

/// Collapse every whitespace run (spaces, tabs, newlines) to a single space
/// and trim the ends. Idempotent.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Count tokens in a text under the shared vocabulary.
pub fn count_tokens(text: &str) -> usize {
    TOKENIZER.encode_ordinary(text).len()
}

/// A bounded, possibly-overlapping slice of a document's tokenized text.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Normalized chunk text, never empty.
    pub text: String,
    /// 0-based position of this chunk within its document.
    pub index: usize,
}

/// Splits normalized text into overlapping, token-bounded chunks.
#[derive(Debug, Clone)]
pub struct TokenChunker {
    max_tokens: usize,
    overlap_tokens: usize,
}

impl TokenChunker {
    /// Create a chunker. Rejects a zero-width window and an overlap that
    /// would make the step non-positive.
    pub fn new(max_tokens: usize, overlap_tokens: usize) -> Result<Self> {
        if max_tokens == 0 {
            return Err(KorpusError::Config(
                "max_tokens must be positive".to_string(),
            ));
        }
        if overlap_tokens >= max_tokens {
            return Err(KorpusError::Config(format!(
                "overlap_tokens ({}) must be less than max_tokens ({})",
                overlap_tokens, max_tokens
            )));
        }
        Ok(Self {
            max_tokens,
            overlap_tokens,
        })
    }

    /// Split `text` into ordered chunks.
    ///
    /// Adjacent chunks share exactly `overlap_tokens` tokens, except the
    /// final chunk which may be shorter. A window whose decoded, normalized
    /// text is empty is dropped without consuming an index.
    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        let tokens = TOKENIZER.encode_ordinary(text);
        let step = self.max_tokens - self.overlap_tokens;

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < tokens.len() {
            let end = (start + self.max_tokens).min(tokens.len());
            let window = tokens[start..end].to_vec();
            let decoded = TOKENIZER
                .decode(window)
                .map_err(|e| KorpusError::InvalidInput(format!("token decode failed: {e}")))?;
            let normalized = normalize_text(&decoded);
            if !normalized.is_empty() {
                chunks.push(Chunk {
                    text: normalized,
                    index: chunks.len(),
                });
            }
            if end == tokens.len() {
                break;
            }
            start += step;
        }

        Ok(chunks)
    }

    /// The window size in tokens.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Tokens shared between adjacent windows.
    pub fn overlap_tokens(&self) -> usize {
        self.overlap_tokens
    }
}
