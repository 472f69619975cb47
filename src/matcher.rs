//! Utterance normalization and classification against a [`Vocabulary`].

use crate::vocabulary::Vocabulary;

/// Trims surrounding whitespace and lower-cases the transcript.
pub fn normalize(utterance: &str) -> String {
    utterance.trim().to_lowercase()
}

/// Outcome of comparing one utterance with the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// The utterance is itself a vocabulary word.
    Exact(String),
    /// The utterance contains this vocabulary word.
    Partial(String),
    /// Nothing matched, the utterance is used as reference.
    NoMatch(String),
}

impl MatchResult {
    /// The word that gets named in the feedback and spoken back.
    pub fn word(&self) -> &str {
        match self {
            MatchResult::Exact(word) | MatchResult::Partial(word) | MatchResult::NoMatch(word) => {
                word
            }
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, MatchResult::Exact(_))
    }
}

/// Classifies a raw transcript.
///
/// Partial matches pick the first vocabulary word (in vocabulary order) found
/// as a substring, not the one appearing first in the utterance.
pub fn classify(vocabulary: &Vocabulary, utterance: &str) -> MatchResult {
    let spoken = normalize(utterance);
    if vocabulary.contains(&spoken) {
        return MatchResult::Exact(spoken);
    }
    match vocabulary.iter().find(|word| spoken.contains(*word)) {
        Some(word) => MatchResult::Partial(word.to_string()),
        None => MatchResult::NoMatch(spoken),
    }
}
