//! Word corpus loading and board draws.

use crate::error::SessionError;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::path::Path;

/// Candidate words a board is drawn from.
#[derive(Debug, Clone)]
pub struct WordPool {
    words: Vec<String>,
}

impl WordPool {
    /// Builds a pool from newline- or comma-delimited text.
    ///
    /// Entries are trimmed, empty entries are skipped and repeated entries keep
    /// only their first occurrence, so every draw yields distinct words.
    pub fn from_text(text: &str) -> Self {
        let mut seen = HashSet::new();
        let words = text
            .split(['\n', ','])
            .map(str::trim)
            .filter(|word| !word.is_empty())
            .filter(|word| seen.insert(*word))
            .map(str::to_owned)
            .collect();

        Self { words }
    }

    /// Reads the corpus file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let pool = Self::from_text(&text);
        info!("Loaded {} words from {}", pool.len(), path.display());
        Ok(pool)
    }

    /// Number of distinct usable words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true when the corpus had no usable words at all.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Samples `n` distinct words uniformly without replacement.
    pub fn draw<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<String>, SessionError> {
        if self.words.len() < n {
            return Err(SessionError::InsufficientCorpus {
                required: n,
                available: self.words.len(),
            });
        }

        Ok(self.words.choose_multiple(rng, n).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn corpus(n: usize) -> WordPool {
        let text = (0..n).map(|i| format!("word{i}")).collect::<Vec<_>>().join("\n");
        WordPool::from_text(&text)
    }

    #[test]
    fn test_from_text_mixed_delimiters() {
        let pool = WordPool::from_text("apple, banana\ncherry,,\n  date \n\n");
        assert_eq!(pool.words, vec!["apple", "banana", "cherry", "date"]);
    }

    #[test]
    fn test_from_text_windows_line_endings() {
        let pool = WordPool::from_text("apple\r\nbanana\r\n");
        assert_eq!(pool.words, vec!["apple", "banana"]);
    }

    #[test]
    fn test_from_text_drops_repeats() {
        let pool = WordPool::from_text("moon,sun\nmoon\nstar, sun");
        assert_eq!(pool.words, vec!["moon", "sun", "star"]);
    }

    #[test]
    fn test_draw_distinct_words() {
        let pool = corpus(400);
        let mut rng = StdRng::seed_from_u64(7);
        let drawn = pool.draw(25, &mut rng).unwrap();

        assert_eq!(drawn.len(), 25);
        let unique: HashSet<&String> = drawn.iter().collect();
        assert_eq!(unique.len(), 25);
        assert!(drawn.iter().all(|w| pool.words.contains(w)));
    }

    #[test]
    fn test_draw_reproducible_with_seed() {
        let pool = corpus(400);
        let first = pool.draw(25, &mut StdRng::seed_from_u64(42)).unwrap();
        let second = pool.draw(25, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_draw_exact_corpus_size() {
        let pool = corpus(25);
        let drawn = pool.draw(25, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(drawn.len(), 25);
    }

    #[test]
    fn test_draw_insufficient_corpus() {
        let pool = corpus(24);
        let err = pool.draw(25, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InsufficientCorpus {
                required: 25,
                available: 24
            }
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = WordPool::load("/definitely/not/here/words.txt").unwrap_err();
        assert!(matches!(err, SessionError::Corpus(_)));
    }
}
