//! Document ingestion for the two corpora
//!
//! Scans `{data_dir}/docs` and `{data_dir}/refs` for PDF, Markdown, and
//! plain-text files and turns them into page/chunk-granular [`DocChunk`]s.
//! One unreadable file is a warning, never a fatal error.

pub mod chunker;
pub mod pdf;
pub mod text;

use crate::errors::Result;
use crate::ingest::chunker::split_text;
use crate::types::{Corpus, DocChunk};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of scanning one or both corpora
#[derive(Debug, Default)]
pub struct IngestReport {
    pub chunks: Vec<DocChunk>,
    pub files_read: usize,
    pub warnings: Vec<String>,
}

/// Loads documents from the on-disk corpus layout
pub struct CorpusLoader {
    data_dir: PathBuf,
    chunk_chars: usize,
    chunk_overlap: usize,
}

impl CorpusLoader {
    pub fn new(data_dir: impl Into<PathBuf>, chunk_chars: usize, chunk_overlap: usize) -> Self {
        Self {
            data_dir: data_dir.into(),
            chunk_chars,
            chunk_overlap,
        }
    }

    /// Directory backing a corpus, created on demand (app behavior: a
    /// missing data dir is an empty corpus, not an error)
    pub fn corpus_dir(&self, corpus: Corpus) -> PathBuf {
        self.data_dir.join(corpus.as_str())
    }

    /// Count ingestible files in a corpus without reading them
    pub fn count_files(&self, corpus: Corpus) -> usize {
        self.list_files(self.corpus_dir(corpus))
            .map(|files| files.len())
            .unwrap_or(0)
    }

    /// Load every document in a single corpus
    pub fn load_corpus(&self, corpus: Corpus) -> Result<IngestReport> {
        let dir = self.corpus_dir(corpus);
        fs::create_dir_all(&dir)?;

        let mut report = IngestReport::default();
        for path in self.list_files(dir)? {
            match self.load_file(&path, corpus) {
                Ok(chunks) => {
                    report.files_read += 1;
                    report.chunks.extend(chunks);
                }
                Err(e) => report.warnings.push(e.to_string()),
            }
        }

        Ok(report)
    }

    /// Load both corpora
    pub fn load_all(&self) -> Result<IngestReport> {
        let mut combined = IngestReport::default();
        for corpus in Corpus::ALL {
            let report = self.load_corpus(corpus)?;
            combined.files_read += report.files_read;
            combined.chunks.extend(report.chunks);
            combined.warnings.extend(report.warnings);
        }
        Ok(combined)
    }

    fn load_file(&self, path: &Path, corpus: Corpus) -> Result<Vec<DocChunk>> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => {
                let pages = pdf::extract_pages(path, corpus)?;
                // Long pages still have to respect the chunk budget
                Ok(self.rechunk_pages(pages))
            }
            "md" | "txt" => {
                text::extract_chunks(path, corpus, self.chunk_chars, self.chunk_overlap)
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Split any extracted page that exceeds the chunk budget
    fn rechunk_pages(&self, pages: Vec<DocChunk>) -> Vec<DocChunk> {
        let mut out = Vec::with_capacity(pages.len());
        for page in pages {
            if page.text.chars().count() <= self.chunk_chars {
                out.push(page);
                continue;
            }
            let pieces = split_text(&page.text, self.chunk_chars, self.chunk_overlap);
            for (i, text) in pieces.into_iter().enumerate() {
                out.push(DocChunk {
                    id: format!("{}-c{}", page.id, i + 1),
                    text,
                    source: page.source.clone(),
                    page: page.page,
                    corpus: page.corpus,
                });
            }
        }
        out
    }

    fn list_files(&self, dir: PathBuf) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && matches!(
                        path.extension()
                            .map(|e| e.to_string_lossy().to_lowercase())
                            .as_deref(),
                        Some("pdf") | Some("md") | Some("txt")
                    )
            })
            .collect();

        // Deterministic ingest order
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader(dir: &Path) -> CorpusLoader {
        CorpusLoader::new(dir, 2000, 200)
    }

    #[test]
    fn test_missing_data_dir_is_empty_corpus() {
        let temp = tempfile::tempdir().unwrap();
        let loader = loader(&temp.path().join("nonexistent"));
        let report = loader.load_corpus(Corpus::Docs).unwrap();
        assert!(report.chunks.is_empty());
        assert_eq!(report.files_read, 0);
    }

    #[test]
    fn test_load_text_files() {
        let temp = tempfile::tempdir().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("a.md"), "# Alpha\n\nContent A.").unwrap();
        fs::write(docs.join("b.txt"), "Content B.").unwrap();
        fs::write(docs.join("skip.csv"), "not,ingested").unwrap();

        let loader = loader(temp.path());
        let report = loader.load_corpus(Corpus::Docs).unwrap();
        assert_eq!(report.files_read, 2);
        assert_eq!(report.chunks.len(), 2);
        assert!(report.warnings.is_empty());
        // sorted order: a.md before b.txt
        assert_eq!(report.chunks[0].source, "a.md");
    }

    #[test]
    fn test_bad_pdf_is_warning_not_error() {
        let temp = tempfile::tempdir().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("broken.pdf"), b"not a real pdf").unwrap();
        fs::write(docs.join("good.txt"), "Still ingested.").unwrap();

        let loader = loader(temp.path());
        let report = loader.load_corpus(Corpus::Docs).unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.chunks.len(), 1);
        assert_eq!(report.chunks[0].source, "good.txt");
    }

    #[test]
    fn test_load_all_spans_both_corpora() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::create_dir_all(temp.path().join("refs")).unwrap();
        fs::write(temp.path().join("docs/d.txt"), "doc corpus").unwrap();
        fs::write(temp.path().join("refs/r.txt"), "ref corpus").unwrap();

        let loader = loader(temp.path());
        let report = loader.load_all().unwrap();
        assert_eq!(report.chunks.len(), 2);
        let corpora: Vec<Corpus> = report.chunks.iter().map(|c| c.corpus).collect();
        assert!(corpora.contains(&Corpus::Docs));
        assert!(corpora.contains(&Corpus::Refs));
    }

    #[test]
    fn test_count_files() {
        let temp = tempfile::tempdir().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("one.txt"), "x").unwrap();
        fs::write(docs.join("two.md"), "y").unwrap();

        let loader = loader(temp.path());
        assert_eq!(loader.count_files(Corpus::Docs), 2);
        assert_eq!(loader.count_files(Corpus::Refs), 0);
    }
}
