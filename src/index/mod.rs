//! Vector index: Qdrant storage plus the corpus store that ties
//! ingestion, embeddings, and search together

pub mod store;
pub mod vector_db;

pub use store::CorpusStore;
pub use vector_db::{SearchHit, VectorDb};
