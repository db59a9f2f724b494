//! Retrieval pipeline: semantic search, re-ranking, safety screening,
//! and citation-ready context assembly
//!
//! Components:
//! - Retrieval Engine: embedding search across one or both corpora
//! - Re-ranker: similarity plus keyword/corpus boosts
//! - Context Builder: numbered passages under a token budget
//! - Pipeline: retrieve -> screen -> rerank -> assemble

pub mod context;
pub mod pipeline;
pub mod rerank;
pub mod retrieval;

pub use context::{AssembledContext, ContextBuilder, ContextEntry};
pub use pipeline::RagPipeline;
pub use rerank::ReRanker;
pub use retrieval::RetrievalEngine;
