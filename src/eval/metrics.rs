//! Lexical retrieval and answer metrics
//!
//! Deterministic stand-ins for the judge-model metrics of the RAGAS family:
//! every score is term overlap over content words, in [0, 1]. Content words
//! are lowercased alphanumeric tokens longer than 3 chars minus a small
//! stopword list; citation markers like `[2]` are stripped first.

use std::collections::HashSet;

const STOPWORDS: &[&str] = &[
    "about", "after", "also", "been", "before", "being", "between", "both",
    "does", "during", "each", "from", "have", "into", "more", "most", "other",
    "over", "same", "should", "some", "such", "than", "that", "their", "them",
    "then", "there", "these", "they", "this", "those", "under", "very", "was",
    "were", "what", "when", "where", "which", "while", "will", "with", "would",
];

/// Content-word set for a piece of text
fn content_words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3 && !STOPWORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}

/// Strip `[n]` citation markers before scoring
fn strip_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '[' {
            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() {
                    digits.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            if chars.peek() == Some(&']') && !digits.is_empty() {
                chars.next();
                continue;
            }
            out.push(c);
            out.push_str(&digits);
            continue;
        }
        out.push(c);
    }
    out
}

fn overlap_fraction(subject: &HashSet<String>, reference: &HashSet<String>) -> f32 {
    if subject.is_empty() {
        return 0.0;
    }
    let supported = subject.iter().filter(|w| reference.contains(*w)).count();
    supported as f32 / subject.len() as f32
}

/// Faithfulness: how much of the answer's content is supported by the
/// assembled context. 1.0 means every answer term appears in the context.
pub fn faithfulness(answer: &str, context: &str) -> f32 {
    let answer_words = content_words(&strip_markers(answer));
    let context_words = content_words(context);
    overlap_fraction(&answer_words, &context_words)
}

/// Answer relevancy: how much of the question's content the answer engages
/// with.
pub fn answer_relevancy(question: &str, answer: &str) -> f32 {
    let question_words = content_words(question);
    let answer_words = content_words(&strip_markers(answer));
    overlap_fraction(&question_words, &answer_words)
}

/// Context precision: fraction of retrieved passages that look relevant to
/// the ground truth (share at least one content word with it).
pub fn context_precision(ground_truth: &str, passages: &[String]) -> f32 {
    if passages.is_empty() {
        return 0.0;
    }
    let truth_words = content_words(ground_truth);
    if truth_words.is_empty() {
        return 0.0;
    }

    let relevant = passages
        .iter()
        .filter(|p| {
            let passage_words = content_words(p);
            truth_words.iter().any(|w| passage_words.contains(w))
        })
        .count();

    relevant as f32 / passages.len() as f32
}

/// Context recall: how much of the ground truth the assembled context
/// covers.
pub fn context_recall(ground_truth: &str, context: &str) -> f32 {
    let truth_words = content_words(ground_truth);
    let context_words = content_words(context);
    overlap_fraction(&truth_words, &context_words)
}
