//! commrag - terminal RAG over local document corpora
//!
//! Indexes the `docs/` and `refs/` corpora into Qdrant with local
//! all-MiniLM-L6-v2 embeddings, retrieves and re-ranks passages for a
//! question, and asks an Ollama model for an answer that is constrained
//! to the retrieved passages and cites them with `[n]` markers.

pub mod answer;
pub mod cli;
pub mod config;
pub mod doctor;
pub mod embedding;
pub mod errors;
pub mod eval;
pub mod index;
pub mod ingest;
pub mod rag;
pub mod repl;
pub mod safety;
pub mod telemetry;
pub mod types;

pub use config::Config;
pub use errors::{RagError, Result};
pub use types::{Corpus, DocChunk};
