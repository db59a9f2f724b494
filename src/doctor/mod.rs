//! System diagnostics
//!
//! `commrag doctor` checks every external dependency the pipeline needs:
//! Qdrant, Ollama, the answer model, the data directory, and the cached
//! embedding model.

use std::path::PathBuf;

use crate::answer::OllamaClient;
use crate::config::Config;
use crate::index::vector_db::VectorDb;
use crate::ingest::CorpusLoader;
use crate::types::Corpus;

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn,
    Fail,
}

impl HealthStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Pass => "✓",
            HealthStatus::Warn => "!",
            HealthStatus::Fail => "✗",
        }
    }
}

/// One named diagnostic with its result
#[derive(Debug, Clone)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    pub detail: String,
}

impl HealthCheck {
    fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Pass,
            detail: detail.into(),
        }
    }

    fn warn(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Warn,
            detail: detail.into(),
        }
    }

    fn fail(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Fail,
            detail: detail.into(),
        }
    }
}

/// Runs the full diagnostic suite
pub struct Doctor {
    config: Config,
}

impl Doctor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run every check. Never errors: failures are reported as checks.
    pub async fn run_all(&self) -> Vec<HealthCheck> {
        let mut checks = vec![self.check_data_dir(), self.check_embedding_cache()];
        checks.push(self.check_qdrant().await);
        let ollama_up = {
            let check = self.check_ollama().await;
            let up = check.status == HealthStatus::Pass;
            checks.push(check);
            up
        };
        checks.push(self.check_answer_model(ollama_up).await);
        checks
    }

    /// True when nothing failed outright
    pub fn healthy(checks: &[HealthCheck]) -> bool {
        checks.iter().all(|c| c.status != HealthStatus::Fail)
    }

    async fn check_qdrant(&self) -> HealthCheck {
        let url = &self.config.paths.qdrant_url;
        match VectorDb::connect(url).await {
            Ok(db) => {
                let mut counts = Vec::new();
                for corpus in Corpus::ALL {
                    match db.collection_stats(corpus).await {
                        Ok(n) => counts.push(format!("{}: {} points", corpus, n)),
                        Err(_) => counts.push(format!("{}: no collection", corpus)),
                    }
                }
                HealthCheck::pass("Qdrant", format!("{} ({})", url, counts.join(", ")))
            }
            Err(e) => HealthCheck::fail("Qdrant", format!("cannot reach {}: {}", url, e)),
        }
    }

    async fn check_ollama(&self) -> HealthCheck {
        let url = &self.config.models.ollama_url;
        let client = match OllamaClient::with_config(url, &self.config.models.answer_model) {
            Ok(c) => c,
            Err(e) => return HealthCheck::fail("Ollama", e.to_string()),
        };

        match client.health_check().await {
            Ok(true) => HealthCheck::pass("Ollama", url.clone()),
            _ => HealthCheck::fail("Ollama", format!("cannot reach {}", url)),
        }
    }

    async fn check_answer_model(&self, ollama_up: bool) -> HealthCheck {
        let model = &self.config.models.answer_model;
        if !ollama_up {
            return HealthCheck::warn("Answer model", format!("{} (Ollama unreachable)", model));
        }

        let client = match OllamaClient::with_config(&self.config.models.ollama_url, model) {
            Ok(c) => c,
            Err(e) => return HealthCheck::fail("Answer model", e.to_string()),
        };

        match client.has_model().await {
            Ok(true) => HealthCheck::pass("Answer model", model.clone()),
            Ok(false) => HealthCheck::fail(
                "Answer model",
                format!("{} not installed. Run: ollama pull {}", model, model),
            ),
            Err(e) => HealthCheck::warn("Answer model", e.to_string()),
        }
    }

    fn check_data_dir(&self) -> HealthCheck {
        let data_dir = &self.config.paths.data_dir;
        if !data_dir.exists() {
            return HealthCheck::warn(
                "Data directory",
                format!("{} does not exist yet", data_dir.display()),
            );
        }

        let loader = CorpusLoader::new(
            data_dir,
            self.config.retrieval.chunk_chars,
            self.config.retrieval.chunk_overlap,
        );
        let docs = loader.count_files(Corpus::Docs);
        let refs = loader.count_files(Corpus::Refs);

        if docs + refs == 0 {
            HealthCheck::warn(
                "Data directory",
                format!("{} contains no ingestible files", data_dir.display()),
            )
        } else {
            HealthCheck::pass(
                "Data directory",
                format!("{} (docs: {} files, refs: {} files)", data_dir.display(), docs, refs),
            )
        }
    }

    fn check_embedding_cache(&self) -> HealthCheck {
        let model = &self.config.models.embedding_model;
        match hub_cache_dir() {
            Some(dir) if dir.exists() => {
                HealthCheck::pass("Embedding model", format!("{} (hub cache present)", model))
            }
            _ => HealthCheck::warn(
                "Embedding model",
                format!("{} will be downloaded on first index", model),
            ),
        }
    }
}

fn hub_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".cache").join("huggingface").join("hub"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(data_dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.paths.data_dir = data_dir.to_path_buf();
        config
    }

    #[test]
    fn test_missing_data_dir_warns() {
        let temp = tempfile::tempdir().unwrap();
        let doctor = Doctor::new(test_config(&temp.path().join("nope")));
        let check = doctor.check_data_dir();
        assert_eq!(check.status, HealthStatus::Warn);
    }

    #[test]
    fn test_populated_data_dir_passes() {
        let temp = tempfile::tempdir().unwrap();
        let docs = temp.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("handbook.md"), "# Handbook").unwrap();

        let doctor = Doctor::new(test_config(temp.path()));
        let check = doctor.check_data_dir();
        assert_eq!(check.status, HealthStatus::Pass);
        assert!(check.detail.contains("docs: 1 files"));
    }

    #[test]
    fn test_healthy_ignores_warnings() {
        let checks = vec![
            HealthCheck::pass("a", ""),
            HealthCheck::warn("b", ""),
        ];
        assert!(Doctor::healthy(&checks));

        let checks = vec![HealthCheck::fail("c", "")];
        assert!(!Doctor::healthy(&checks));
    }

    #[tokio::test]
    #[ignore] // Requires Qdrant and Ollama running
    async fn test_run_all_against_live_services() {
        let temp = tempfile::tempdir().unwrap();
        let doctor = Doctor::new(test_config(temp.path()));
        let checks = doctor.run_all().await;
        assert_eq!(checks.len(), 5);
    }
}
