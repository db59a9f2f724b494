// Re-ranking scorer for retrieved passages
use serde::{Deserialize, Serialize};

use crate::rag::retrieval::RetrievedPassage;
use crate::types::Corpus;

/// Re-ranking strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankingStrategy {
    /// Use similarity scores only
    Similarity,
    /// Similarity blended with corpus priority and keyword boost
    Hybrid,
}

/// Re-ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReRankConfig {
    pub strategy: RankingStrategy,
    /// Weight for corpus priority (0.0 to 1.0) in hybrid mode; the primary
    /// `docs` corpus outranks `refs` at equal similarity
    pub corpus_weight: f32,
    /// Boost cap for exact keyword matches
    pub keyword_boost: f32,
}

impl Default for ReRankConfig {
    fn default() -> Self {
        Self {
            strategy: RankingStrategy::Hybrid,
            corpus_weight: 0.15,
            keyword_boost: 0.1,
        }
    }
}

/// Passage with a re-ranked score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPassage {
    pub passage: RetrievedPassage,
    pub original_score: f32,
    pub reranked_score: f32,
    pub boost_applied: f32,
}

/// Re-ranker for improving retrieval order
pub struct ReRanker {
    config: ReRankConfig,
}

impl ReRanker {
    pub fn new() -> Self {
        Self {
            config: ReRankConfig::default(),
        }
    }

    pub fn with_config(config: ReRankConfig) -> Self {
        Self { config }
    }

    /// Re-rank passages based on strategy
    pub fn rerank(&self, passages: Vec<RetrievedPassage>, query: &str) -> Vec<RankedPassage> {
        let mut ranked: Vec<RankedPassage> = passages
            .into_iter()
            .map(|passage| {
                let original_score = passage.score;
                let reranked_score = self.compute_score(&passage, query);
                let boost_applied = reranked_score - original_score;

                RankedPassage {
                    passage,
                    original_score,
                    reranked_score,
                    boost_applied,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.reranked_score
                .partial_cmp(&a.reranked_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        ranked
    }

    fn compute_score(&self, passage: &RetrievedPassage, query: &str) -> f32 {
        let base_score = passage.score;

        match self.config.strategy {
            RankingStrategy::Similarity => base_score,
            RankingStrategy::Hybrid => {
                let corpus_score = self.corpus_priority(passage);
                let keyword_boost = self.compute_keyword_boost(passage, query);

                let similarity_weight = 1.0 - self.config.corpus_weight;
                let combined = (base_score * similarity_weight)
                    + (corpus_score * self.config.corpus_weight)
                    + keyword_boost;

                combined.min(1.0)
            }
        }
    }

    /// Static corpora have no useful recency signal; priority comes from
    /// which corpus the passage belongs to instead
    fn corpus_priority(&self, passage: &RetrievedPassage) -> f32 {
        match passage.corpus {
            Some(Corpus::Docs) => 1.0,
            Some(Corpus::Refs) => 0.5,
            None => 0.5,
        }
    }

    /// Boost for exact keyword matches from the query
    fn compute_keyword_boost(&self, passage: &RetrievedPassage, query: &str) -> f32 {
        let query_lower = query.to_lowercase();
        let content_lower = passage.text.to_lowercase();

        let query_words: Vec<&str> = query_lower.split_whitespace().collect();
        let matches = query_words
            .iter()
            .filter(|word| word.len() > 3 && content_lower.contains(*word))
            .count();

        if matches > 0 && !query_words.is_empty() {
            let boost_per_match = self.config.keyword_boost / query_words.len() as f32;
            (matches as f32 * boost_per_match).min(self.config.keyword_boost)
        } else {
            0.0
        }
    }

    pub fn config(&self) -> &ReRankConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ReRankConfig) {
        self.config = config;
    }
}

impl Default for ReRanker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str, text: &str, score: f32, corpus: Corpus) -> RetrievedPassage {
        RetrievedPassage {
            id: id.to_string(),
            text: text.to_string(),
            source: format!("{}.pdf", id),
            page: Some(1),
            corpus: Some(corpus),
            score,
        }
    }

    #[test]
    fn test_similarity_strategy_keeps_scores() {
        let ranker = ReRanker::with_config(ReRankConfig {
            strategy: RankingStrategy::Similarity,
            corpus_weight: 0.0,
            keyword_boost: 0.0,
        });

        let ranked = ranker.rerank(
            vec![
                passage("a", "content", 0.9, Corpus::Docs),
                passage("b", "content", 0.8, Corpus::Refs),
            ],
            "query",
        );

        assert_eq!(ranked[0].passage.id, "a");
        assert_eq!(ranked[0].reranked_score, 0.9);
        assert_eq!(ranked[0].boost_applied, 0.0);
    }

    #[test]
    fn test_hybrid_prefers_docs_at_equal_similarity() {
        let ranker = ReRanker::new();

        let ranked = ranker.rerank(
            vec![
                passage("ref", "identical content", 0.8, Corpus::Refs),
                passage("doc", "identical content", 0.8, Corpus::Docs),
            ],
            "unrelated words",
        );

        assert_eq!(ranked[0].passage.id, "doc");
        assert!(ranked[0].reranked_score > ranked[1].reranked_score);
    }

    #[test]
    fn test_keyword_boost_applies() {
        let ranker = ReRanker::new();
        let boosted = ranker.compute_keyword_boost(
            &passage("a", "funds from operations explained", 0.7, Corpus::Docs),
            "explain funds from operations",
        );
        assert!(boosted > 0.0);

        let unboosted = ranker.compute_keyword_boost(
            &passage("b", "completely unrelated text", 0.7, Corpus::Docs),
            "funds operations",
        );
        assert_eq!(unboosted, 0.0);
    }

    #[test]
    fn test_rerank_sorts_descending() {
        let ranker = ReRanker::with_config(ReRankConfig {
            strategy: RankingStrategy::Similarity,
            corpus_weight: 0.0,
            keyword_boost: 0.0,
        });

        let ranked = ranker.rerank(
            vec![
                passage("low", "x", 0.6, Corpus::Docs),
                passage("high", "x", 0.9, Corpus::Docs),
                passage("mid", "x", 0.7, Corpus::Docs),
            ],
            "query",
        );

        assert_eq!(ranked[0].passage.id, "high");
        assert_eq!(ranked[1].passage.id, "mid");
        assert_eq!(ranked[2].passage.id, "low");
    }

    #[test]
    fn test_hybrid_score_capped() {
        let ranker = ReRanker::new();
        let ranked = ranker.rerank(
            vec![passage("a", "match match match words", 0.99, Corpus::Docs)],
            "match words",
        );
        assert!(ranked[0].reranked_score <= 1.0);
    }
}
