//! The fixed list of target words an exercise trains against.

use crate::error::Error;
use crate::matcher::normalize;

/// Words used when the configuration does not provide any.
pub const DEFAULT_WORDS: [&str; 10] = [
    "apple", "banana", "cat", "dog", "elephant", "hello", "goodbye", "water", "thank", "please",
];

/// Ordered, unique, lowercase target words.
///
/// Order matters: partial matches report the first word, in this order, that
/// is contained in the utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    words: Vec<String>,
}

impl Vocabulary {
    /// Builds a vocabulary, normalizing every word.
    ///
    /// Empty words and words that collide after normalization are rejected.
    pub fn new<I, S>(words: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for word in words {
            let word = normalize(word.as_ref());
            if word.is_empty() {
                return Err(Error::Vocabulary("empty word".to_string()));
            }
            if normalized.contains(&word) {
                return Err(Error::Vocabulary(format!("duplicate word '{word}'")));
            }
            normalized.push(word);
        }
        if normalized.is_empty() {
            return Err(Error::Vocabulary("no words given".to_string()));
        }
        Ok(Self { words: normalized })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Prompt listing the first `count` words, with an ellipsis when some are left out.
    pub fn hint(&self, count: usize) -> String {
        let shown: Vec<&str> = self.iter().take(count).collect();
        let mut hint = format!("Try saying: {}", shown.join(", "));
        if self.words.len() > count {
            hint.push_str("...");
        }
        hint
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}
