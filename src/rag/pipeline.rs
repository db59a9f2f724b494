// End-to-end retrieval pipeline: retrieve -> screen -> rerank -> assemble
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::SafetyConfig;
use crate::errors::RagError;
use crate::index::CorpusStore;
use crate::rag::context::{AssembledContext, ContextBuilder, ContextConfig};
use crate::rag::rerank::{RankedPassage, ReRankConfig, ReRanker};
use crate::rag::retrieval::{RetrievalEngine, SearchParams};
use crate::safety::SafetyChecker;

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub search: SearchParams,
    pub rerank: ReRankConfig,
    pub context: ContextConfig,
    pub safety: SafetyConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search: SearchParams::default(),
            rerank: ReRankConfig::default(),
            context: ContextConfig::default(),
            safety: SafetyConfig::default(),
        }
    }
}

/// Pipeline result handed to the answerer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub query: String,
    /// Screened passages in re-ranked order (superset of what fit in the
    /// context budget)
    pub passages: Vec<RankedPassage>,
    pub context: AssembledContext,
    /// Passages returned by vector search
    pub passages_retrieved: usize,
    /// Passages dropped by safety screening
    pub passages_dropped: usize,
}

/// End-to-end retrieval pipeline
pub struct RagPipeline {
    retrieval_engine: RetrievalEngine,
    reranker: ReRanker,
    context_builder: ContextBuilder,
    safety: SafetyChecker,
    config: PipelineConfig,
}

impl RagPipeline {
    pub fn new(store: Arc<CorpusStore>) -> Self {
        Self::with_config(store, PipelineConfig::default())
    }

    pub fn with_config(store: Arc<CorpusStore>, config: PipelineConfig) -> Self {
        Self {
            retrieval_engine: RetrievalEngine::with_params(store, config.search.clone()),
            reranker: ReRanker::with_config(config.rerank.clone()),
            context_builder: ContextBuilder::with_config(config.context.clone()),
            safety: SafetyChecker::new(config.safety.redact_pii),
            config,
        }
    }

    /// Execute the pipeline with default search parameters
    pub async fn execute(&self, query: &str) -> Result<PipelineResult> {
        let params = self.config.search.clone();
        self.execute_with_params(query, &params).await
    }

    /// Execute with explicit search parameters.
    ///
    /// Screening order is part of the contract: the query is screened
    /// before any retrieval happens, passages before context assembly.
    pub async fn execute_with_params(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> Result<PipelineResult> {
        if self.config.safety.screen_queries {
            let report = self.safety.screen(query);
            if report.is_blocked() {
                return Err(RagError::SafetyBlocked(report.reason()).into());
            }
        }

        let retrieved = self
            .retrieval_engine
            .retrieve_with_params(query, params)
            .await
            .context("Failed to retrieve passages")?;
        let passages_retrieved = retrieved.len();

        // Indexed documents are untrusted; drop passages that carry
        // injection phrasing, redact PII in the rest
        let mut screened = Vec::with_capacity(retrieved.len());
        for mut passage in retrieved {
            if self.config.safety.screen_passages && self.safety.screen(&passage.text).is_blocked()
            {
                continue;
            }
            passage.text = self.safety.sanitize(&passage.text);
            screened.push(passage);
        }
        let passages_dropped = passages_retrieved - screened.len();

        let ranked = self.reranker.rerank(screened, query);
        let context = self.context_builder.build(&ranked);

        Ok(PipelineResult {
            query: query.to_string(),
            passages: ranked,
            context,
            passages_retrieved,
            passages_dropped,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.search.top_k, 3);
        assert_eq!(config.context.max_context_tokens, 2000);
        assert!(config.safety.screen_queries);
    }

    #[test]
    fn test_pipeline_result_shape() {
        let result = PipelineResult {
            query: "test query".to_string(),
            passages: Vec::new(),
            context: AssembledContext {
                text: "context".to_string(),
                estimated_tokens: 100,
                entries: Vec::new(),
            },
            passages_retrieved: 5,
            passages_dropped: 1,
        };

        assert_eq!(result.passages_retrieved, 5);
        assert_eq!(result.passages_dropped, 1);
        assert!(result.context.is_empty());
    }
}
