// Context builder: numbered, citation-ready passages under a token budget
use serde::{Deserialize, Serialize};

use crate::rag::rerank::RankedPassage;

/// Context assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum tokens for retrieved context (estimated at ~4 chars/token)
    pub max_context_tokens: usize,
    /// Include similarity scores in the passage headers
    pub include_scores: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: 2000,
            include_scores: false,
        }
    }
}

/// One passage that made it into the context, keyed by its `[n]` marker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    /// 1-based marker the answer model cites as `[n]`
    pub index: usize,
    pub chunk_id: String,
    pub source: String,
    pub page: Option<u32>,
    pub score: f32,
}

/// Assembled context for prompt augmentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledContext {
    /// The formatted context text
    pub text: String,
    /// Estimated token count
    pub estimated_tokens: usize,
    /// Entries for citation resolution, in `[n]` order
    pub entries: Vec<ContextEntry>,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a `[n]` marker to its entry
    pub fn entry(&self, index: usize) -> Option<&ContextEntry> {
        self.entries.iter().find(|e| e.index == index)
    }
}

/// Context builder
pub struct ContextBuilder {
    config: ContextConfig,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            config: ContextConfig::default(),
        }
    }

    pub fn with_config(config: ContextConfig) -> Self {
        Self { config }
    }

    /// Build numbered context from ranked passages.
    ///
    /// Passages are admitted in rank order until the token budget would be
    /// exceeded. Each gets a header like `[2] report.pdf p.7`.
    pub fn build(&self, passages: &[RankedPassage]) -> AssembledContext {
        let mut parts = Vec::new();
        let mut entries = Vec::new();
        let mut total_tokens = 0;

        for ranked in passages {
            let passage = &ranked.passage;

            // Rough token estimate: ~4 chars per token
            let passage_tokens = passage.text.len() / 4;
            if total_tokens + passage_tokens > self.config.max_context_tokens {
                break;
            }

            let index = entries.len() + 1;
            let header = if self.config.include_scores {
                format!("[{}] {} (score: {:.2})", index, passage.label(), ranked.reranked_score)
            } else {
                format!("[{}] {}", index, passage.label())
            };
            parts.push(format!("{}\n{}", header, passage.text));

            entries.push(ContextEntry {
                index,
                chunk_id: passage.id.clone(),
                source: passage.source.clone(),
                page: passage.page,
                score: ranked.reranked_score,
            });
            total_tokens += passage_tokens;
        }

        let text = if parts.is_empty() {
            String::new()
        } else {
            format!(
                "Retrieved passages ({}):\n\n{}\n",
                entries.len(),
                parts.join("\n\n")
            )
        };

        AssembledContext {
            text,
            estimated_tokens: total_tokens,
            entries,
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ContextConfig) {
        self.config = config;
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::retrieval::RetrievedPassage;
    use crate::types::Corpus;

    fn ranked(id: &str, text: &str, page: Option<u32>, score: f32) -> RankedPassage {
        RankedPassage {
            passage: RetrievedPassage {
                id: id.to_string(),
                text: text.to_string(),
                source: "report.pdf".to_string(),
                page,
                corpus: Some(Corpus::Docs),
                score,
            },
            original_score: score,
            reranked_score: score,
            boost_applied: 0.0,
        }
    }

    #[test]
    fn test_build_empty() {
        let builder = ContextBuilder::new();
        let context = builder.build(&[]);
        assert!(context.is_empty());
        assert_eq!(context.estimated_tokens, 0);
        assert!(context.text.is_empty());
    }

    #[test]
    fn test_numbered_markers_and_entries() {
        let builder = ContextBuilder::new();
        let context = builder.build(&[
            ranked("report.pdf-p7", "First passage", Some(7), 0.9),
            ranked("report.pdf-p2", "Second passage", Some(2), 0.8),
        ]);

        assert!(context.text.contains("[1] report.pdf p.7"));
        assert!(context.text.contains("[2] report.pdf p.2"));
        assert_eq!(context.entries.len(), 2);
        assert_eq!(context.entry(2).unwrap().page, Some(2));
        assert!(context.entry(3).is_none());
    }

    #[test]
    fn test_token_budget_respected() {
        let builder = ContextBuilder::with_config(ContextConfig {
            max_context_tokens: 10,
            include_scores: false,
        });

        let context = builder.build(&[
            ranked("a", "short", Some(1), 0.9),
            ranked("b", &"long ".repeat(50), Some(2), 0.8),
        ]);

        // only the short passage fits
        assert_eq!(context.entries.len(), 1);
        assert!(context.estimated_tokens <= 10);
    }

    #[test]
    fn test_scores_toggle() {
        let builder = ContextBuilder::with_config(ContextConfig {
            max_context_tokens: 2000,
            include_scores: true,
        });
        let context = builder.build(&[ranked("a", "text", Some(1), 0.87)]);
        assert!(context.text.contains("score: 0.87"));
    }
}
