//! Command-line argument parsing
//!
//! clap-based CLI with subcommands and verbosity control. Flags override
//! the corresponding config file values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::types::Corpus;

/// commrag - ask questions about your local document corpora
#[derive(Parser, Debug)]
#[command(name = "commrag")]
#[command(version)]
#[command(about = "Terminal RAG over local document corpora with cited, constrained answers", long_about = None)]
pub struct Args {
    /// Data directory holding the docs/ and refs/ corpora
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Qdrant server URL
    #[arg(long)]
    pub qdrant_url: Option<String>,

    /// Ollama server URL
    #[arg(long)]
    pub ollama_url: Option<String>,

    /// Ollama answer model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Restrict retrieval to one corpus: docs or refs
    #[arg(long)]
    pub corpus: Option<String>,

    /// Number of passages to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except results)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the vector index from the data directory
    Index,

    /// Ask a question and get a cited answer
    Ask {
        /// The question to answer
        question: String,
    },

    /// Semantic search only: show matching passages without answering
    Search {
        /// The search query
        query: String,
    },

    /// Interactive chat session
    Chat,

    /// Show index statistics
    Stats,

    /// Run the evaluation harness over a JSONL question set
    Eval {
        /// Path to the JSONL file of {question, ground_truth} cases
        file: PathBuf,

        /// Where to write the JSON report
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Run system diagnostics and health checks
    Doctor,

    /// Display current configuration
    Config,
}

/// Verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Parse the --corpus flag
    pub fn corpus_filter(&self) -> Result<Option<Corpus>, String> {
        match &self.corpus {
            None => Ok(None),
            Some(name) => Corpus::parse(name)
                .map(Some)
                .ok_or_else(|| format!("Unknown corpus '{}'. Use 'docs' or 'refs'.", name)),
        }
    }

    /// Overlay CLI flags on top of the loaded config
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(data_dir) = &self.data_dir {
            config.paths.data_dir = data_dir.clone();
        }
        if let Some(url) = &self.qdrant_url {
            config.paths.qdrant_url = url.clone();
        }
        if let Some(url) = &self.ollama_url {
            config.models.ollama_url = url.clone();
        }
        if let Some(model) = &self.model {
            config.models.answer_model = model.clone();
        }
        if let Some(top_k) = self.top_k {
            config.retrieval.top_k = top_k;
        }
    }
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if progress bars should be shown
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if stage telemetry should be shown
    pub fn show_telemetry(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }

    /// Check if full passage text should be shown in search output
    pub fn show_passages(&self) -> bool {
        matches!(self, Verbosity::VeryVerbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_ask_subcommand() {
        let args = parse(&["commrag", "ask", "What is LUV-FFO?"]);
        match &args.command {
            Commands::Ask { question } => assert_eq!(question, "What is LUV-FFO?"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["commrag", "index"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["commrag", "-v", "index"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["commrag", "-vv", "index"]).verbosity(), Verbosity::VeryVerbose);
        assert_eq!(parse(&["commrag", "-q", "index"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_corpus_filter() {
        let args = parse(&["commrag", "--corpus", "docs", "search", "margins"]);
        assert_eq!(args.corpus_filter().unwrap(), Some(Corpus::Docs));

        let args = parse(&["commrag", "--corpus", "bogus", "search", "margins"]);
        assert!(args.corpus_filter().is_err());

        let args = parse(&["commrag", "search", "margins"]);
        assert_eq!(args.corpus_filter().unwrap(), None);
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&[
            "commrag",
            "--data-dir",
            "/tmp/corpora",
            "--model",
            "llama3.1:8b",
            "-k",
            "7",
            "ask",
            "q",
        ]);

        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.paths.data_dir, PathBuf::from("/tmp/corpora"));
        assert_eq!(config.models.answer_model, "llama3.1:8b");
        assert_eq!(config.retrieval.top_k, 7);
    }

    #[test]
    fn test_eval_subcommand_with_out() {
        let args = parse(&["commrag", "eval", "cases.jsonl", "--out", "report.json"]);
        match &args.command {
            Commands::Eval { file, out } => {
                assert_eq!(file, &PathBuf::from("cases.jsonl"));
                assert_eq!(out.as_deref(), Some(std::path::Path::new("report.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_methods() {
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());
        assert!(!Verbosity::Normal.show_telemetry());
        assert!(Verbosity::Verbose.show_telemetry());
        assert!(!Verbosity::Verbose.show_passages());
        assert!(Verbosity::VeryVerbose.show_passages());
    }
}
