//! PII pattern detection and redaction
//!
//! Regex heuristics for the PII shapes that actually show up in corporate
//! document dumps: emails, phone numbers, SSN-shaped ids, card numbers.
//! Card candidates are Luhn-checked to keep false positives down.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PiiKind {
    Email,
    Phone,
    Ssn,
    CardNumber,
}

impl PiiKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Ssn => "ssn",
            Self::CardNumber => "card",
        }
    }
}

impl fmt::Display for PiiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected PII span
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiiFinding {
    pub kind: PiiKind,
    /// Matched text, kept for redaction; never logged verbatim
    pub matched: String,
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
    })
}

fn ssn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Requires separators so bare figures like "20230415" don't match
    RE.get_or_init(|| {
        Regex::new(r"(\+\d{1,3}[ .-]?)?(\(\d{2,4}\)[ .-]?)?\d{3}[ .-]\d{3}[ .-]?\d{2,4}\b").unwrap()
    })
}

fn card_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:\d[ -]?){13,16}\b").unwrap())
}

/// Luhn checksum; used to confirm card-shaped digit runs
fn luhn_valid(digits: &str) -> bool {
    let digits: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Scan text for PII spans
pub fn scan_pii(text: &str) -> Vec<PiiFinding> {
    let mut findings = Vec::new();

    for m in email_re().find_iter(text) {
        findings.push(PiiFinding {
            kind: PiiKind::Email,
            matched: m.as_str().to_string(),
        });
    }

    for m in ssn_re().find_iter(text) {
        findings.push(PiiFinding {
            kind: PiiKind::Ssn,
            matched: m.as_str().to_string(),
        });
    }

    for m in card_re().find_iter(text) {
        if luhn_valid(m.as_str()) {
            findings.push(PiiFinding {
                kind: PiiKind::CardNumber,
                matched: m.as_str().to_string(),
            });
        }
    }

    for m in phone_re().find_iter(text) {
        // Skip spans already claimed by SSN/card matches
        let already = findings
            .iter()
            .any(|f| f.kind != PiiKind::Email && f.matched.contains(m.as_str().trim()));
        if !already {
            findings.push(PiiFinding {
                kind: PiiKind::Phone,
                matched: m.as_str().to_string(),
            });
        }
    }

    findings
}

/// Replace detected PII with `[REDACTED:<kind>]` markers
pub fn redact_pii(text: &str) -> String {
    let mut out = text.to_string();

    out = email_re()
        .replace_all(&out, "[REDACTED:email]")
        .to_string();
    out = ssn_re().replace_all(&out, "[REDACTED:ssn]").to_string();

    // Card redaction goes through scan so Luhn filtering applies
    let card_matches: Vec<String> = card_re()
        .find_iter(&out)
        .filter(|m| luhn_valid(m.as_str()))
        .map(|m| m.as_str().to_string())
        .collect();
    for matched in card_matches {
        out = out.replace(&matched, "[REDACTED:card]");
    }

    out = phone_re()
        .replace_all(&out, "[REDACTED:phone]")
        .to_string();

    out
}
