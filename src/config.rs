use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Top-level configuration, persisted as TOML at `~/.commrag/config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root directory holding the `docs/` and `refs/` corpora
    pub data_dir: PathBuf,
    /// Qdrant server URL
    pub qdrant_url: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            qdrant_url: "http://127.0.0.1:6334".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Ollama base URL
    pub ollama_url: String,
    /// Answer model served by Ollama
    pub answer_model: String,
    /// Embedding model downloaded from the HuggingFace Hub
    pub embedding_model: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://127.0.0.1:11434".to_string(),
            answer_model: "qwen2.5:7b-instruct".to_string(),
            embedding_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of passages to retrieve per query
    pub top_k: usize,
    /// Minimum cosine similarity for a hit
    pub threshold: f64,
    /// Token budget for assembled context (estimated at 4 chars/token)
    pub max_context_tokens: usize,
    /// Character budget per chunk before splitting
    pub chunk_chars: usize,
    /// Overlap carried between adjacent chunks
    pub chunk_overlap: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            threshold: 0.35,
            max_context_tokens: 2000,
            chunk_chars: 2000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Screen queries for prompt-injection phrasing
    pub screen_queries: bool,
    /// Drop retrieved passages that look like injection attempts
    pub screen_passages: bool,
    /// Redact PII patterns in assembled context
    pub redact_pii: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            screen_queries: true,
            screen_passages: true,
            redact_pii: true,
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load from an explicit path (used by `--config`)
    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        if !config_path.exists() {
            let config = Config::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".commrag").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            paths: PathsConfig::default(),
            models: ModelsConfig::default(),
            retrieval: RetrievalConfig::default(),
            safety: SafetyConfig::default(),
        }
    }
}
