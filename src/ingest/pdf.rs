//! Page-granular PDF text extraction
//!
//! Each non-empty page becomes one chunk with id `{file}-p{page}`, so
//! citations can point at an exact page.

use crate::errors::{RagError, Result};
use crate::types::{Corpus, DocChunk};
use lopdf::Document;
use std::path::Path;

/// Extract one chunk per non-empty page of a PDF
pub fn extract_pages(path: &Path, corpus: Corpus) -> Result<Vec<DocChunk>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let doc = Document::load(path).map_err(|e| RagError::Extraction {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut chunks = Vec::new();
    for (page_number, _object_id) in doc.get_pages() {
        let text = match doc.extract_text(&[page_number]) {
            Ok(text) => text,
            // A single bad page shouldn't sink the file
            Err(_) => continue,
        };

        let text = normalize(&text);
        if text.is_empty() {
            continue;
        }

        chunks.push(DocChunk {
            id: format!("{}-p{}", file_name, page_number),
            text,
            source: file_name.clone(),
            page: Some(page_number),
            corpus,
        });
    }

    Ok(chunks)
}

/// Collapse extraction artifacts: stray CRs, runs of blank lines, edge whitespace
fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0usize;
    for line in raw.replace('\r', "\n").lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}
