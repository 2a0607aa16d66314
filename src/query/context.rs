//! Conversational context extraction.
//!
//! Before routing, every question is scanned for a provisional subject and
//! action and classified as a follow-up (anaphoric pronoun referring to an
//! entity from a prior turn). The result replaces the session's shared
//! context wholesale — except for follow-ups, which read the prior subject
//! without mutating it first.
//!
//! Entity extraction sits behind the narrow [`EntityExtractor`] trait so
//! the word-list heuristics can be swapped for a real tagger without
//! touching routing logic.

use std::collections::HashSet;

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;

/// Pronouns that mark a question as referring back to a prior entity.
static FOLLOW_UP_PRONOUNS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["it", "this", "that", "they", "these", "those"]
        .into_iter()
        .collect()
});

/// Small verb lexicon for action extraction. Not a tagger, just the verbs
/// that actually occur in terminal questions.
static COMMON_VERBS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "is", "are", "was", "were", "show", "give", "get", "tell", "find", "check", "compare",
        "buy", "sell", "look", "perform", "performing", "doing", "going", "trading", "list",
        "explain", "describe", "make", "create", "want", "need", "know",
    ]
    .into_iter()
    .collect()
});

/// Captures the capitalized phrase in "X stock" phrasing.
static SUBJECT_BEFORE_STOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Z][\w&.]*(?:\s+[A-Z][\w&.]*)*)\s+[sS]tock").unwrap()
});

/// Captures "stock price of X" phrasing.
static SUBJECT_OF_STOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)stock\s+(?:price|value)\s+(?:of|for)\s+([A-Za-z][A-Za-z\s&.]*)").unwrap()
});

/// Shared conversational context, one per session.
#[derive(Debug, Clone)]
pub struct QuestionContext {
    /// Tag of the domain that last resolved a query (`general` until a
    /// handler claims one).
    pub category: String,
    /// Last resolved subject — a ticker, location, or noun phrase.
    pub subject: Option<String>,
    /// First verb found; informational only.
    pub action: Option<String>,
    pub timestamp: DateTime<Local>,
}

/// Result of entity extraction over one question.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Candidate entity phrases, best-first.
    pub candidates: Vec<String>,
    /// Verbs in order of appearance.
    pub verbs: Vec<String>,
}

/// Narrow entity-extraction capability.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Extraction;
}

/// Word-list heuristic extractor.
///
/// Candidates are runs of capitalized tokens (skipping the sentence-initial
/// word unless it is part of a longer run), which is enough to pick out
/// company and place names from terminal questions.
pub struct HeuristicExtractor;

impl EntityExtractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> Extraction {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut candidates: Vec<String> = Vec::new();
        let mut verbs: Vec<String> = Vec::new();

        let mut run: Vec<&str> = Vec::new();
        for (i, raw) in words.iter().enumerate() {
            let word = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '&');
            if word.is_empty() {
                // A pure-punctuation token still separates entity phrases.
                flush_run(&mut run, i, &mut candidates);
                continue;
            }

            let lower = word.to_lowercase();
            if COMMON_VERBS.contains(lower.as_str()) {
                verbs.push(lower.clone());
            }

            let capitalized = word.chars().next().is_some_and(|c| c.is_uppercase());
            if capitalized {
                run.push(word);
            } else {
                flush_run(&mut run, i, &mut candidates);
            }
        }
        flush_run(&mut run, words.len(), &mut candidates);

        Extraction { candidates, verbs }
    }
}

/// Close out a run of capitalized words. A single sentence-initial
/// capitalized word is discarded (it is almost never an entity).
fn flush_run(run: &mut Vec<&str>, end_index: usize, candidates: &mut Vec<String>) {
    if run.is_empty() {
        return;
    }
    let len = run.len();
    let starts_sentence = end_index == len; // run began at word 0
    if !(starts_sentence && len == 1) {
        candidates.push(run.join(" "));
    }
    run.clear();
}

/// True when the question leans on a pronoun instead of naming its subject.
pub fn is_follow_up(text: &str) -> bool {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .any(|w| FOLLOW_UP_PRONOUNS.contains(w.as_str()))
}

/// Build the provisional context for a question.
///
/// Subject preference: a regex-captured company/stock phrase, else the last
/// extracted candidate phrase. Action: first verb found.
pub fn extract_context(text: &str, extractor: &dyn EntityExtractor) -> QuestionContext {
    let extraction = extractor.extract(text);

    let subject = SUBJECT_BEFORE_STOCK_RE
        .captures(text)
        .or_else(|| SUBJECT_OF_STOCK_RE.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| extraction.candidates.last().cloned());

    QuestionContext {
        category: "general".to_string(),
        subject,
        action: extraction.verbs.first().cloned(),
        timestamp: Local::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_up_detection() {
        assert!(is_follow_up("is it promising?"));
        assert!(is_follow_up("how is this stock doing"));
        assert!(!is_follow_up("Apple stock price"));
    }

    #[test]
    fn test_follow_up_strips_punctuation() {
        assert!(is_follow_up("what about it?"));
    }

    #[test]
    fn test_extractor_finds_capitalized_phrase() {
        let ex = HeuristicExtractor.extract("what is the Goldman Sachs stock price");
        assert!(ex.candidates.contains(&"Goldman Sachs".to_string()));
    }

    #[test]
    fn test_separator_token_breaks_capitalized_run() {
        let ex = HeuristicExtractor.extract("the Apple - Microsoft comparison");
        assert_eq!(
            ex.candidates,
            vec!["Apple".to_string(), "Microsoft".to_string()]
        );
    }

    #[test]
    fn test_extractor_skips_sentence_initial_word() {
        let ex = HeuristicExtractor.extract("Show me the weather");
        assert!(ex.candidates.is_empty());
    }

    #[test]
    fn test_extractor_finds_verbs_in_order() {
        let ex = HeuristicExtractor.extract("show me how Tesla is doing");
        assert_eq!(ex.verbs.first().map(String::as_str), Some("show"));
    }

    #[test]
    fn test_context_prefers_stock_phrase() {
        let ctx = extract_context("what is the Apple stock price", &HeuristicExtractor);
        assert_eq!(ctx.subject.as_deref(), Some("Apple"));
        assert_eq!(ctx.category, "general");
    }

    #[test]
    fn test_context_action_is_first_verb() {
        let ctx = extract_context("show me the Tesla stock price", &HeuristicExtractor);
        assert_eq!(ctx.action.as_deref(), Some("show"));
    }

    #[test]
    fn test_context_without_entities() {
        let ctx = extract_context("hello there", &HeuristicExtractor);
        assert!(ctx.subject.is_none());
    }
}
