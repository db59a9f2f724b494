//! Heuristic safety screening
//!
//! Two concerns, both regex/phrase heuristics rather than model calls:
//!
//! - prompt-injection phrasing in user queries and in retrieved passages
//!   (indexed documents are untrusted input to the answer model)
//! - PII patterns in text that is about to be shown or sent onward
//!
//! Screening order is fixed: queries are screened before retrieval,
//! passages before context assembly, PII redaction last.

pub mod injection;
pub mod pii;

pub use injection::{scan_injection, InjectionFinding};
pub use pii::{redact_pii, scan_pii, PiiFinding, PiiKind};

use serde::{Deserialize, Serialize};

/// Verdict for a screened piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Clean
    Allow,
    /// PII found; usable after redaction
    Flag,
    /// Injection phrasing found; must not reach the model
    Block,
}

/// Full screening report for one piece of text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyReport {
    pub verdict: Verdict,
    pub injection: Vec<InjectionFinding>,
    pub pii: Vec<PiiFinding>,
}

impl SafetyReport {
    pub fn is_blocked(&self) -> bool {
        self.verdict == Verdict::Block
    }

    /// One-line reason string for logs and refusal messages
    pub fn reason(&self) -> String {
        if let Some(finding) = self.injection.first() {
            return format!("injection pattern: \"{}\"", finding.matched);
        }
        if let Some(finding) = self.pii.first() {
            return format!("pii detected: {}", finding.kind);
        }
        "clean".to_string()
    }
}

/// Screens queries and passages
pub struct SafetyChecker {
    redact_pii: bool,
}

impl SafetyChecker {
    pub fn new(redact_pii: bool) -> Self {
        Self { redact_pii }
    }

    /// Screen a piece of text and classify it
    pub fn screen(&self, text: &str) -> SafetyReport {
        let injection = scan_injection(text);
        let pii = scan_pii(text);

        let verdict = if !injection.is_empty() {
            Verdict::Block
        } else if !pii.is_empty() {
            Verdict::Flag
        } else {
            Verdict::Allow
        };

        SafetyReport {
            verdict,
            injection,
            pii,
        }
    }

    /// Apply PII redaction if enabled, otherwise pass through
    pub fn sanitize(&self, text: &str) -> String {
        if self.redact_pii {
            redact_pii(text)
        } else {
            text.to_string()
        }
    }
}

impl Default for SafetyChecker {
    fn default() -> Self {
        Self::new(true)
    }
}
