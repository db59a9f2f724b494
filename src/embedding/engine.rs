// Sentence embeddings via Candle - all-MiniLM-L6-v2 by default
use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::Tokenizer;

/// Default embedding model (the one the index was designed around)
pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Embedding dimension for MiniLM-L6
pub const EMBEDDING_DIM: usize = 384;

/// Embedding engine running a BERT sentence encoder on CPU
pub struct EmbeddingEngine {
    model: Arc<BertModel>,
    tokenizer: Arc<Tokenizer>,
    device: Device,
}

impl EmbeddingEngine {
    /// Create an engine for the default model (downloads on first use)
    pub fn new() -> Result<Self> {
        Self::with_model(DEFAULT_MODEL_ID)
    }

    /// Create an engine for a specific HuggingFace Hub model
    pub fn with_model(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo.get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo.get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        let weights_path = repo.get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;
        let config: Config = serde_json::from_str(&config_contents)
            .context("Failed to parse model config")?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(
                &[weights_path],
                candle_core::DType::F32,
                &device,
            ).context("Failed to load model weights")?
        };

        let model = BertModel::load(vb, &config)
            .context("Failed to create BERT model")?;

        Ok(Self {
            model: Arc::new(model),
            tokenizer: Arc::new(tokenizer),
            device,
        })
    }

    /// Generate embedding for a single text
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text])?;
        batch.pop().context("Embedding batch returned no rows")
    }

    /// Generate embeddings for multiple texts (batched)
    pub fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self.tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let mut token_ids_vec = Vec::new();
        let mut attention_mask_vec = Vec::new();

        for encoding in &encodings {
            token_ids_vec.push(encoding.get_ids().to_vec());
            attention_mask_vec.push(encoding.get_attention_mask().to_vec());
        }

        let max_len = token_ids_vec.iter().map(|ids| ids.len()).max().unwrap_or(0);
        let batch_size = texts.len();

        // Pad sequences to the longest in the batch
        let mut padded_ids = vec![vec![0u32; max_len]; batch_size];
        let mut padded_mask = vec![vec![0u32; max_len]; batch_size];

        for (i, (ids, mask)) in token_ids_vec.iter().zip(attention_mask_vec.iter()).enumerate() {
            padded_ids[i][..ids.len()].copy_from_slice(ids);
            padded_mask[i][..mask.len()].copy_from_slice(mask);
        }

        let flat_ids: Vec<u32> = padded_ids.into_iter().flatten().collect();
        let flat_mask: Vec<u32> = padded_mask.into_iter().flatten().collect();

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;

        let embeddings = self.model.forward(&token_ids, &attention_mask, None)?;

        // Mean pooling then L2 normalization, as the sentence-transformers
        // export of this model does
        let pooled = Self::mean_pool(&embeddings, &attention_mask)?;
        let normalized = Self::l2_normalize(&pooled)?;

        let embedding_data = normalized.to_vec2::<f32>()?;

        Ok(embedding_data)
    }

    /// Mean pooling with attention mask
    fn mean_pool(embeddings: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mask_expanded = attention_mask
            .unsqueeze(2)?
            .expand(embeddings.shape())?
            .to_dtype(embeddings.dtype())?;

        let sum_embeddings = (embeddings * &mask_expanded)?.sum(1)?;
        let sum_mask = mask_expanded.sum(1)?.clamp(1e-9, f64::MAX)?;

        let pooled = sum_embeddings.broadcast_div(&sum_mask)?;

        Ok(pooled)
    }

    /// Row-wise L2 normalization
    fn l2_normalize(embeddings: &Tensor) -> Result<Tensor> {
        let norms = embeddings.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-9, f64::MAX)?;
        Ok(embeddings.broadcast_div(&norms)?)
    }

    /// Embedding dimension (384 for MiniLM-L6)
    pub fn dimension(&self) -> usize {
        EMBEDDING_DIM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore]  // Integration test - requires model download
    fn test_embedding_dimension() {
        let engine = EmbeddingEngine::new().expect("Failed to create engine");
        assert_eq!(engine.dimension(), 384);
    }

    #[test]
    #[ignore]  // Integration test - requires model download
    fn test_embed_single_text() {
        let engine = EmbeddingEngine::new().expect("Failed to create engine");
        let embedding = engine.embed("Hello world").expect("Failed to embed");
        assert_eq!(embedding.len(), 384);
        // normalized output
        let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[test]
    #[ignore]  // Integration test - requires model download
    fn test_embed_batch() {
        let engine = EmbeddingEngine::new().expect("Failed to create engine");
        let texts = vec!["funds from operations", "quarterly report", "route network"];
        let embeddings = engine.embed_batch(&texts).expect("Failed to embed batch");
        assert_eq!(embeddings.len(), 3);
        assert!(embeddings.iter().all(|e| e.len() == 384));
    }

    #[test]
    #[ignore]  // Integration test - requires model download
    fn test_embed_empty_batch() {
        let engine = EmbeddingEngine::new().expect("Failed to create engine");
        let embeddings = engine.embed_batch(&[]).expect("Failed to embed empty batch");
        assert_eq!(embeddings.len(), 0);
    }
}
