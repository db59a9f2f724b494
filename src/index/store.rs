// Corpus store - coordinates embeddings and vector storage
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::embedding::EmbeddingEngine;
use crate::index::vector_db::{SearchHit, VectorDb};
use crate::ingest::CorpusLoader;
use crate::types::{Corpus, DocChunk};

/// Embedding batch size; pages are embedded in groups to bound peak memory
const EMBED_BATCH: usize = 16;

/// Result of a full index rebuild
#[derive(Debug, Default)]
pub struct RebuildSummary {
    pub chunks_indexed: usize,
    pub files_read: usize,
    pub warnings: Vec<String>,
    /// Time spent reading and chunking files
    pub ingest_time: Duration,
    /// Time spent embedding and upserting
    pub index_time: Duration,
}

/// Coordinates the embedding engine and the vector database
pub struct CorpusStore {
    embedding_engine: Arc<EmbeddingEngine>,
    vector_db: Arc<VectorDb>,
}

impl CorpusStore {
    /// Create a store: loads the embedding model and connects to Qdrant
    pub async fn new(qdrant_url: &str, embedding_model: &str) -> Result<Self> {
        let embedding_engine = Arc::new(
            EmbeddingEngine::with_model(embedding_model)
                .context("Failed to create embedding engine")?,
        );

        let vector_db = Arc::new(
            VectorDb::connect(qdrant_url)
                .await
                .context("Failed to connect to vector database")?,
        );

        Ok(Self {
            embedding_engine,
            vector_db,
        })
    }

    /// Clean-slate rebuild of both corpora: drop collections, re-ingest
    /// everything on disk, return the number of chunks indexed
    pub async fn rebuild(&self, loader: &CorpusLoader) -> Result<RebuildSummary> {
        let mut summary = RebuildSummary::default();

        for corpus in Corpus::ALL {
            self.vector_db
                .reset_collection(corpus)
                .await
                .context(format!("Failed to reset collection: {}", corpus))?;

            let ingest_start = Instant::now();
            let report = loader
                .load_corpus(corpus)
                .context(format!("Failed to ingest corpus: {}", corpus))?;
            summary.ingest_time += ingest_start.elapsed();
            summary.files_read += report.files_read;
            summary.warnings.extend(report.warnings);

            let index_start = Instant::now();
            summary.chunks_indexed += self.index_chunks(corpus, report.chunks).await?;
            summary.index_time += index_start.elapsed();
        }

        Ok(summary)
    }

    /// Embed and upsert a set of chunks into their corpus collection
    pub async fn index_chunks(&self, corpus: Corpus, chunks: Vec<DocChunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut indexed = 0;
        for batch in chunks.chunks(EMBED_BATCH) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self
                .embedding_engine
                .embed_batch(&texts)
                .context("Failed to generate batch embeddings")?;

            let items: Vec<_> = batch
                .iter()
                .zip(embeddings.into_iter())
                .map(|(chunk, embedding)| {
                    (
                        chunk.id.clone(),
                        chunk.text.clone(),
                        embedding,
                        chunk.metadata(),
                    )
                })
                .collect();

            self.vector_db
                .add_batch(corpus, items)
                .await
                .context("Failed to store batch")?;
            indexed += batch.len();
        }

        Ok(indexed)
    }

    /// Search a single corpus
    pub async fn search(
        &self,
        query: &str,
        corpus: Corpus,
        n_results: usize,
        threshold: f64,
    ) -> Result<Vec<SearchHit>> {
        let query_embedding = self
            .embedding_engine
            .embed(query)
            .context("Failed to generate query embedding")?;

        self.vector_db
            .query(corpus, &query_embedding, n_results, threshold)
            .await
            .context("Failed to search vector database")
    }

    /// Search both corpora, merge by score
    pub async fn search_all(
        &self,
        query: &str,
        n_results: usize,
        threshold: f64,
    ) -> Result<Vec<SearchHit>> {
        let query_embedding = self
            .embedding_engine
            .embed(query)
            .context("Failed to generate query embedding")?;

        let mut all_hits = Vec::new();
        for corpus in Corpus::ALL {
            let hits = self
                .vector_db
                .query(corpus, &query_embedding, n_results, threshold)
                .await
                .context(format!("Failed to search corpus: {}", corpus))?;
            all_hits.extend(hits);
        }

        all_hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        all_hits.truncate(n_results);

        Ok(all_hits)
    }

    /// Delete a chunk by id
    pub async fn delete(&self, corpus: Corpus, chunk_id: &str) -> Result<()> {
        self.vector_db
            .delete(corpus, chunk_id)
            .await
            .context("Failed to delete chunk")
    }

    /// Point count for a corpus
    pub async fn stats(&self, corpus: Corpus) -> Result<u64> {
        self.vector_db
            .collection_stats(corpus)
            .await
            .context("Failed to get stats")
    }

    /// Total points across both corpora
    pub async fn total_count(&self) -> Result<u64> {
        let mut total = 0;
        for corpus in Corpus::ALL {
            total += self.vector_db.collection_stats(corpus).await?;
        }
        Ok(total)
    }
}
