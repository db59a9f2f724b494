// Retrieval engine for semantic search over the corpora
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::index::vector_db::SearchHit;
use crate::index::CorpusStore;
use crate::types::Corpus;

/// Search parameters for retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of passages to retrieve
    pub top_k: usize,
    /// Minimum similarity threshold (0.0 to 1.0)
    pub threshold: f64,
    /// Restrict to one corpus (None = both)
    pub corpus: Option<Corpus>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: 3,
            threshold: 0.35,
            corpus: None,
        }
    }
}

/// Retrieved passage with its provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub id: String,
    pub text: String,
    pub source: String,
    pub page: Option<u32>,
    pub corpus: Option<Corpus>,
    pub score: f32,
}

impl From<SearchHit> for RetrievedPassage {
    fn from(hit: SearchHit) -> Self {
        let source = hit
            .metadata
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let page = hit
            .metadata
            .get("page")
            .and_then(|v| v.as_u64())
            .map(|p| p as u32);
        let corpus = hit
            .metadata
            .get("corpus")
            .and_then(|v| v.as_str())
            .and_then(Corpus::parse);

        Self {
            id: hit.id,
            text: hit.text,
            source,
            page,
            corpus,
            score: hit.score,
        }
    }
}

impl RetrievedPassage {
    /// Citation label, e.g. `report.pdf p.3`
    pub fn label(&self) -> String {
        match self.page {
            Some(page) => format!("{} p.{}", self.source, page),
            None => self.source.clone(),
        }
    }
}

/// Retrieval engine for semantic search
pub struct RetrievalEngine {
    store: Arc<CorpusStore>,
    default_params: SearchParams,
}

impl RetrievalEngine {
    pub fn new(store: Arc<CorpusStore>) -> Self {
        Self {
            store,
            default_params: SearchParams::default(),
        }
    }

    pub fn with_params(store: Arc<CorpusStore>, params: SearchParams) -> Self {
        Self {
            store,
            default_params: params,
        }
    }

    /// Retrieve passages matching the query with default parameters
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedPassage>> {
        self.retrieve_with_params(query, &self.default_params).await
    }

    /// Retrieve with explicit parameters
    pub async fn retrieve_with_params(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> Result<Vec<RetrievedPassage>> {
        let hits = match params.corpus {
            Some(corpus) => self
                .store
                .search(query, corpus, params.top_k, params.threshold)
                .await
                .context(format!("Failed to search corpus: {}", corpus))?,
            None => self
                .store
                .search_all(query, params.top_k, params.threshold)
                .await
                .context("Failed to search corpora")?,
        };

        Ok(hits.into_iter().map(RetrievedPassage::from).collect())
    }

    pub fn default_params(&self) -> &SearchParams {
        &self.default_params
    }

    pub fn set_default_params(&mut self, params: SearchParams) {
        self.default_params = params;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_search_params_default() {
        let params = SearchParams::default();
        assert_eq!(params.top_k, 3);
        assert_eq!(params.threshold, 0.35);
        assert!(params.corpus.is_none());
    }

    #[test]
    fn test_passage_from_hit() {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), json!("report.pdf"));
        metadata.insert("page".to_string(), json!(7));
        metadata.insert("corpus".to_string(), json!("docs"));

        let hit = SearchHit {
            id: "report.pdf-p7".to_string(),
            score: 0.82,
            text: "Seventh page".to_string(),
            metadata,
        };

        let passage = RetrievedPassage::from(hit);
        assert_eq!(passage.source, "report.pdf");
        assert_eq!(passage.page, Some(7));
        assert_eq!(passage.corpus, Some(Corpus::Docs));
        assert_eq!(passage.label(), "report.pdf p.7");
    }

    #[test]
    fn test_passage_from_hit_missing_metadata() {
        let hit = SearchHit {
            id: "x".to_string(),
            score: 0.5,
            text: "text".to_string(),
            metadata: HashMap::new(),
        };

        let passage = RetrievedPassage::from(hit);
        assert_eq!(passage.source, "unknown");
        assert_eq!(passage.page, None);
        assert_eq!(passage.label(), "unknown");
    }
}
