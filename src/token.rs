use crate::error::{Error, Result};
use crate::file::read_text;
use std::path::Path;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

const SIMPLE_CHARS_PER_TOKEN: usize = 4;
const ENHANCED_WORD_MULTIPLIER: f64 = 1.3;
const ENHANCED_SPECIAL_DIVISOR: usize = 10;

/// Type of tokenizer to use for estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerKind {
    /// Simple character-based tokenizer (~4 chars per token)
    Simple,
    /// Enhanced tokenizer with word and special character analysis
    Enhanced,
    /// Exact BPE count with the `o200k_base` encoding used by gpt-4o
    O200k,
}

impl TokenizerKind {
    /// Creates a new tokenizer instance of this kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the BPE tables cannot be loaded.
    pub fn create(self) -> Result<Arc<dyn TokenEstimator>> {
        Ok(match self {
            Self::Simple => Arc::new(SimpleTokenizer),
            Self::Enhanced => Arc::new(EnhancedTokenizer),
            Self::O200k => Arc::new(BpeTokenizer::o200k()?),
        })
    }
}

/// Trait for estimating token counts in text.
///
/// Implementations should be thread-safe and efficient.
pub trait TokenEstimator: Send + Sync {
    /// Estimates the number of tokens in the given text.
    fn estimate(&self, text: &str) -> usize;
}

/// Simple character-based tokenizer.
///
/// Uses a heuristic of approximately 4 characters per token,
/// which works reasonably well for source code.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SimpleTokenizer;

impl TokenEstimator for SimpleTokenizer {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        let char_count = text.chars().count();
        char_count
            .saturating_add(SIMPLE_CHARS_PER_TOKEN - 1)
            .saturating_div(SIMPLE_CHARS_PER_TOKEN)
            .max(1)
    }
}

/// Enhanced tokenizer with multiple heuristics.
///
/// This tokenizer considers:
/// - Word count (weighted by 1.3)
/// - Character count (divided by 4)
/// - Special characters (penalty factor)
#[derive(Debug, Clone, Copy)]
pub(crate) struct EnhancedTokenizer;

impl TokenEstimator for EnhancedTokenizer {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        let words = count_words(text);
        let chars = text.chars().count();
        let special_chars = count_special_chars(text);

        let word_estimate = (words as f64 * ENHANCED_WORD_MULTIPLIER) as usize;
        let char_estimate = chars.saturating_div(SIMPLE_CHARS_PER_TOKEN);
        let special_penalty = special_chars.saturating_div(ENHANCED_SPECIAL_DIVISOR);

        let base_estimate = word_estimate
            .saturating_add(char_estimate)
            .saturating_div(2);

        base_estimate.saturating_add(special_penalty).max(1)
    }
}

/// Byte-pair encoding tokenizer backed by `tiktoken-rs`.
pub(crate) struct BpeTokenizer {
    bpe: CoreBPE,
}

impl BpeTokenizer {
    pub(crate) fn o200k() -> Result<Self> {
        let bpe = tiktoken_rs::o200k_base().map_err(|e| Error::Tokenizer {
            message: e.to_string(),
        })?;
        Ok(Self { bpe })
    }
}

impl TokenEstimator for BpeTokenizer {
    fn estimate(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Counts tokens in a UTF-8 text file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded, or the
/// tokenizer cannot be created.
pub fn estimate_file(path: impl AsRef<Path>, kind: TokenizerKind) -> Result<usize> {
    let text = read_text(path.as_ref())?;
    Ok(kind.create()?.estimate(&text))
}

/// Counts words in text (whitespace-separated).
#[inline]
fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Counts special (non-alphanumeric) characters.
#[inline]
fn count_special_chars(text: &str) -> usize {
    text.chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_simple_tokenizer_empty() {
        assert_eq!(SimpleTokenizer.estimate(""), 0);
    }

    #[test]
    fn test_simple_tokenizer_basic() {
        let tokenizer = SimpleTokenizer;
        assert_eq!(tokenizer.estimate("test"), 1);
        assert_eq!(tokenizer.estimate("hello world"), 3);
    }

    #[test]
    fn test_simple_tokenizer_long_text() {
        let text = "a".repeat(1000);
        assert_eq!(SimpleTokenizer.estimate(&text), 250);
    }

    #[test]
    fn test_enhanced_tokenizer_empty() {
        assert_eq!(EnhancedTokenizer.estimate(""), 0);
    }

    #[test]
    fn test_enhanced_tokenizer_code() {
        let code = r#"
            func main() {
                fmt.Println("Hello, world!")
            }
        "#;
        let result = EnhancedTokenizer.estimate(code);
        assert!(result > 5);
        assert!(result < 30);
    }

    #[test]
    fn test_bpe_tokenizer() {
        let tokenizer = BpeTokenizer::o200k().unwrap();

        assert_eq!(tokenizer.estimate(""), 0);
        let count = tokenizer.estimate("File: main.go\npackage main\n\n");
        assert!(count > 3);
        assert!(count < 20);
    }

    #[test]
    fn test_estimate_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("concat.txt");
        file.write_str(&"a".repeat(400)).unwrap();

        assert_eq!(estimate_file(file.path(), TokenizerKind::Simple).unwrap(), 100);
    }

    #[test]
    fn test_estimate_file_missing() {
        let temp = assert_fs::TempDir::new().unwrap();

        let result = estimate_file(temp.path().join("nope.txt"), TokenizerKind::Simple);
        assert!(result.unwrap_err().is_io());
    }

    #[test]
    fn test_count_special_chars() {
        assert_eq!(count_special_chars("hello"), 0);
        assert_eq!(count_special_chars("func f() {}"), 4);
    }
}
