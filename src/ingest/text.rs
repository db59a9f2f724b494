//! Plain-text and Markdown ingestion
//!
//! Whole files are read and handed to the chunker; chunk ids get a `-c{n}`
//! suffix so each split remains individually addressable.

use crate::errors::{RagError, Result};
use crate::ingest::chunker::split_text;
use crate::types::{Corpus, DocChunk};
use std::fs;
use std::path::Path;

/// Read a text/markdown file and split it into chunks
pub fn extract_chunks(
    path: &Path,
    corpus: Corpus,
    chunk_chars: usize,
    chunk_overlap: usize,
) -> Result<Vec<DocChunk>> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let contents = fs::read_to_string(path).map_err(|e| RagError::Extraction {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let contents = contents.trim();
    if contents.is_empty() {
        return Ok(Vec::new());
    }

    let pieces = split_text(contents, chunk_chars, chunk_overlap);
    let chunks = pieces
        .into_iter()
        .enumerate()
        .map(|(i, text)| DocChunk {
            id: format!("{}-c{}", file_name, i + 1),
            text,
            source: file_name.clone(),
            page: None,
            corpus,
        })
        .collect();

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_small_file_single_chunk() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("notes.md");
        fs::write(&path, "# Heading\n\nSome content.").unwrap();

        let chunks = extract_chunks(&path, Corpus::Refs, 2000, 200).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "notes.md-c1");
        assert_eq!(chunks[0].page, None);
        assert_eq!(chunks[0].corpus, Corpus::Refs);
    }

    #[test]
    fn test_empty_file_yields_no_chunks() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("empty.txt");
        fs::write(&path, "  \n\n").unwrap();

        let chunks = extract_chunks(&path, Corpus::Docs, 2000, 200).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_long_file_splits_with_suffixes() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("long.txt");
        let mut file = fs::File::create(&path).unwrap();
        for i in 0..40 {
            writeln!(file, "Paragraph number {} with a bit of filler text.\n", i).unwrap();
        }
        drop(file);

        let chunks = extract_chunks(&path, Corpus::Docs, 400, 50).unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].id, "long.txt-c1");
        assert_eq!(chunks[1].id, "long.txt-c2");
    }
}
