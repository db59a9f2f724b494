//! Prompt-injection phrase heuristics
//!
//! Catches the common instruction-override phrasings. This is a heuristic
//! tripwire, not a classifier: false negatives are expected, false
//! positives should stay rare enough for interactive use.

use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A matched injection pattern with the text that triggered it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectionFinding {
    /// Which pattern fired (stable label, not the regex itself)
    pub pattern: String,
    /// The matched snippet, truncated for display
    pub matched: String,
}

/// (label, regex) pairs; case-insensitive
const PATTERNS: &[(&str, &str)] = &[
    ("override", r"(?i)\bignore\s+(all\s+|any\s+)?(previous|prior|above|earlier)\s+(instructions?|prompts?|context)"),
    ("override", r"(?i)\bdisregard\s+(the\s+)?(above|previous|prior|earlier)"),
    ("override", r"(?i)\bforget\s+(all\s+)?(previous|prior|your)\s+(instructions?|rules?)"),
    ("persona", r"(?i)\byou\s+are\s+now\s+(a|an|the)\b"),
    ("persona", r"(?i)\bpretend\s+(to\s+be|you\s+are)\b"),
    ("persona", r"(?i)\bact\s+as\s+(if\s+you|a\s+jailbroken)"),
    ("exfiltration", r"(?i)\b(reveal|print|show|repeat|output)\b.{0,40}\bsystem\s+prompt\b"),
    ("exfiltration", r"(?i)\bwhat\s+(are|were)\s+your\s+(instructions|rules)\b"),
    ("injection-marker", r"(?i)^\s*system\s*:"),
    ("injection-marker", r"(?i)\[/?(INST|SYS)\]"),
    ("tool-abuse", r"(?i)\b(do\s+not|don't)\s+(cite|quote|use)\s+the\s+(context|documents|sources)\b"),
];

fn pattern_set() -> &'static (RegexSet, Vec<regex::Regex>) {
    static SET: OnceLock<(RegexSet, Vec<regex::Regex>)> = OnceLock::new();
    SET.get_or_init(|| {
        let set = RegexSet::new(PATTERNS.iter().map(|(_, p)| *p))
            .expect("injection patterns must compile");
        let regexes = PATTERNS
            .iter()
            .map(|(_, p)| regex::Regex::new(p).expect("injection patterns must compile"))
            .collect();
        (set, regexes)
    })
}

/// Scan text for injection phrasing
pub fn scan_injection(text: &str) -> Vec<InjectionFinding> {
    let (set, regexes) = pattern_set();
    let mut findings = Vec::new();

    for index in set.matches(text) {
        if let Some(m) = regexes[index].find(text) {
            let mut matched: String = m.as_str().chars().take(60).collect();
            if m.as_str().chars().count() > 60 {
                matched.push('…');
            }
            findings.push(InjectionFinding {
                pattern: PATTERNS[index].0.to_string(),
                matched,
            });
        }
    }

    findings
}
