//! Shared types for corpora and document chunks

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

/// The two document corpora served by the index.
///
/// `Docs` holds the primary material, `Refs` holds supporting reference
/// documents. Each corpus maps to its own subdirectory of the data dir and
/// its own Qdrant collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corpus {
    Docs,
    Refs,
}

impl Corpus {
    pub const ALL: [Corpus; 2] = [Corpus::Docs, Corpus::Refs];

    /// Collection name and data subdirectory
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docs => "docs",
            Self::Refs => "refs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "docs" => Some(Self::Docs),
            "refs" => Some(Self::Refs),
            _ => None,
        }
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One indexable unit of text: a PDF page, a text file, or a split thereof
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocChunk {
    /// Human-readable id, e.g. `report.pdf-p3` or `notes.md-c2`
    pub id: String,
    pub text: String,
    /// Source file name (not the full path)
    pub source: String,
    /// 1-based page number for PDF-derived chunks
    pub page: Option<u32>,
    pub corpus: Corpus,
}

impl DocChunk {
    /// Payload metadata stored alongside the vector
    pub fn metadata(&self) -> HashMap<String, JsonValue> {
        let mut meta = HashMap::new();
        meta.insert("source".to_string(), JsonValue::String(self.source.clone()));
        if let Some(page) = self.page {
            meta.insert("page".to_string(), JsonValue::Number(page.into()));
        }
        meta.insert(
            "corpus".to_string(),
            JsonValue::String(self.corpus.as_str().to_string()),
        );
        meta
    }

    /// Short citation label, e.g. `report.pdf p.3`
    pub fn label(&self) -> String {
        match self.page {
            Some(page) => format!("{} p.{}", self.source, page),
            None => self.source.clone(),
        }
    }
}
