//! Feedback shown to the learner and the observable snapshot of the loop.

use std::fmt;

use crate::matcher::MatchResult;

/// Status line of the listen loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Starting,
    Listening,
    Error(String),
    /// Waiting for the next session, with the code of the error that ended the last one.
    Restarting { last_error: Option<String> },
    Unsupported,
    Stopped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Starting => write!(f, "Starting..."),
            Status::Listening => write!(f, "🎧 Listening..."),
            Status::Error(code) => write!(f, "⚠️ Error: {code}"),
            Status::Restarting { last_error: None } => write!(f, "🔁 Restarting listener..."),
            Status::Restarting {
                last_error: Some(code),
            } => write!(f, "⚠️ Error: {code}, restarting..."),
            Status::Unsupported => write!(f, "❌ Speech recognition not supported"),
            Status::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Read-only view of the loop handed to whoever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub status: Status,
    /// Normalized text of the last utterance
    pub heard: String,
    pub feedback: String,
    /// `None` until the first utterance has been judged
    pub matched: Option<bool>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            status: Status::Starting,
            heard: String::new(),
            feedback: String::new(),
            matched: None,
        }
    }
}

/// Message for the feedback panel.
pub fn feedback_message(result: &MatchResult) -> String {
    match result {
        MatchResult::Exact(word) => format!("✅ Correct pronunciation of '{word}'"),
        MatchResult::Partial(word) | MatchResult::NoMatch(word) => {
            format!("🔊 Try saying: {word}")
        }
    }
}

/// Success notice, only for exact matches.
pub fn success_notice(result: &MatchResult) -> Option<String> {
    match result {
        MatchResult::Exact(word) => Some(format!("Great job! You said \"{word}\" correctly!")),
        _ => None,
    }
}

/// Notice for a recognition error reported by the engine.
pub fn error_notice(code: &str) -> String {
    format!("Error: {code}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_feedback() {
        let result = MatchResult::Exact("cat".to_string());
        assert_eq!(feedback_message(&result), "✅ Correct pronunciation of 'cat'");
        assert_eq!(
            success_notice(&result).as_deref(),
            Some("Great job! You said \"cat\" correctly!")
        );
    }

    #[test]
    fn test_corrective_feedback() {
        let partial = MatchResult::Partial("dog".to_string());
        assert_eq!(feedback_message(&partial), "🔊 Try saying: dog");
        assert_eq!(success_notice(&partial), None);

        let none = MatchResult::NoMatch("banana split".to_string());
        assert_eq!(feedback_message(&none), "🔊 Try saying: banana split");
        assert_eq!(success_notice(&none), None);
    }

    #[test]
    fn test_error_notice() {
        assert_eq!(error_notice("no-speech"), "Error: no-speech");
    }

    #[test]
    fn test_status_text() {
        assert_eq!(Status::Listening.to_string(), "🎧 Listening...");
        assert_eq!(
            Status::Restarting { last_error: None }.to_string(),
            "🔁 Restarting listener..."
        );
        assert_eq!(
            Status::Restarting {
                last_error: Some("no-speech".to_string())
            }
            .to_string(),
            "⚠️ Error: no-speech, restarting..."
        );
        assert_eq!(
            Status::Unsupported.to_string(),
            "❌ Speech recognition not supported"
        );
    }

    #[test]
    fn test_default_snapshot() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.status, Status::Starting);
        assert_eq!(snapshot.matched, None);
        assert!(snapshot.heard.is_empty());
    }
}
