//! Interactive chat session
//!
//! rustyline-based loop over the ask pipeline with a handful of slash
//! commands for tuning retrieval mid-session.

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use std::time::Instant;

use crate::answer::Answerer;
use crate::errors::RagError;
use crate::index::CorpusStore;
use crate::ingest::CorpusLoader;
use crate::rag::retrieval::SearchParams;
use crate::rag::RagPipeline;
use crate::telemetry::{StageEvent, TelemetryCollector};
use crate::types::Corpus;

/// Parsed REPL input
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    Help,
    TopK(usize),
    CorpusFilter(Option<Corpus>),
    Rebuild,
    Stats,
    Quit,
    Ask(String),
    Empty,
    Invalid(String),
}

/// Parse one line of REPL input
pub fn parse_command(input: &str) -> ChatCommand {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ChatCommand::Empty;
    }
    if !trimmed.starts_with('/') {
        return ChatCommand::Ask(trimmed.to_string());
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match command {
        "/help" => ChatCommand::Help,
        "/quit" | "/exit" => ChatCommand::Quit,
        "/rebuild" => ChatCommand::Rebuild,
        "/stats" => ChatCommand::Stats,
        "/topk" => match arg.parse::<usize>() {
            Ok(k) if k > 0 => ChatCommand::TopK(k),
            _ => ChatCommand::Invalid("usage: /topk <n>".to_string()),
        },
        "/corpus" => match arg {
            "all" => ChatCommand::CorpusFilter(None),
            name => match Corpus::parse(name) {
                Some(corpus) => ChatCommand::CorpusFilter(Some(corpus)),
                None => ChatCommand::Invalid("usage: /corpus docs|refs|all".to_string()),
            },
        },
        other => ChatCommand::Invalid(format!("unknown command: {}", other)),
    }
}

const HELP_TEXT: &str = "\
Commands:
  /topk <n>              retrieve n passages per question
  /corpus docs|refs|all  restrict retrieval to one corpus
  /rebuild               rebuild the vector index from disk
  /stats                 show index statistics
  /help                  show this help
  /quit                  exit

Anything else is asked as a question.";

/// Interactive chat session over the ask pipeline
pub struct ChatSession {
    store: Arc<CorpusStore>,
    pipeline: RagPipeline,
    answerer: Answerer,
    loader: CorpusLoader,
    params: SearchParams,
    telemetry: TelemetryCollector,
}

impl ChatSession {
    pub fn new(
        store: Arc<CorpusStore>,
        pipeline: RagPipeline,
        answerer: Answerer,
        loader: CorpusLoader,
        params: SearchParams,
    ) -> Self {
        Self {
            store,
            pipeline,
            answerer,
            loader,
            params,
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Run the readline loop until /quit or EOF
    pub async fn run(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;

        println!("{}", "commrag chat. /help for commands, /quit to exit.".dimmed());

        loop {
            let line = match editor.readline("commrag> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };

            match parse_command(&line) {
                ChatCommand::Empty => continue,
                ChatCommand::Quit => break,
                ChatCommand::Help => println!("{}", HELP_TEXT),
                ChatCommand::Invalid(message) => println!("{}", message.yellow()),
                ChatCommand::TopK(k) => {
                    self.params.top_k = k;
                    println!("top_k = {}", k);
                }
                ChatCommand::CorpusFilter(corpus) => {
                    self.params.corpus = corpus;
                    match corpus {
                        Some(c) => println!("searching corpus: {}", c),
                        None => println!("searching both corpora"),
                    }
                }
                ChatCommand::Rebuild => {
                    if let Err(e) = self.rebuild().await {
                        eprintln!("{} {:#}", "rebuild failed:".red(), e);
                    }
                }
                ChatCommand::Stats => {
                    if let Err(e) = self.print_stats().await {
                        eprintln!("{} {:#}", "stats failed:".red(), e);
                    }
                }
                ChatCommand::Ask(question) => {
                    let _ = editor.add_history_entry(&question);
                    if let Err(e) = self.ask(&question).await {
                        match e.downcast_ref::<RagError>() {
                            Some(RagError::SafetyBlocked(reason)) => {
                                println!("{} {}", "blocked:".yellow(), reason);
                            }
                            _ => eprintln!("{} {:#}", "error:".red(), e),
                        }
                    }
                }
            }
        }

        println!("{}", self.telemetry.summary().dimmed());
        Ok(())
    }

    async fn ask(&self, question: &str) -> Result<()> {
        let search_start = Instant::now();
        let retrieval = self
            .pipeline
            .execute_with_params(question, &self.params)
            .await?;
        self.telemetry.record(StageEvent::SearchCompleted {
            hits: retrieval.passages_retrieved,
            dropped: retrieval.passages_dropped,
            duration: search_start.elapsed(),
        });

        let generate_start = Instant::now();
        let answer = self.answerer.answer(&retrieval).await?;
        self.telemetry.record(StageEvent::GenerateCompleted {
            refused: answer.refused,
            citations: answer.citations.len(),
            duration: generate_start.elapsed(),
        });

        println!("\n{}\n", answer.text);
        if !answer.citations.is_empty() {
            println!("{}", "Sources:".bold());
            for citation in &answer.citations {
                println!("  {}", citation.label());
            }
            println!();
        }

        Ok(())
    }

    async fn rebuild(&self) -> Result<()> {
        println!("rebuilding index...");
        let summary = self.store.rebuild(&self.loader).await?;
        self.telemetry.record(StageEvent::IngestCompleted {
            files: summary.files_read,
            chunks: summary.chunks_indexed,
            duration: summary.ingest_time,
        });
        self.telemetry.record(StageEvent::EmbedCompleted {
            chunks: summary.chunks_indexed,
            duration: summary.index_time,
        });
        println!(
            "{} {} chunks from {} files",
            "indexed".green(),
            summary.chunks_indexed,
            summary.files_read
        );
        for warning in &summary.warnings {
            println!("{} {}", "warning:".yellow(), warning);
        }
        Ok(())
    }

    async fn print_stats(&self) -> Result<()> {
        for corpus in Corpus::ALL {
            let count = self.store.stats(corpus).await?;
            println!("{}: {} points", corpus, count);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_question() {
        assert_eq!(
            parse_command("What is the travel policy?"),
            ChatCommand::Ask("What is the travel policy?".to_string())
        );
    }

    #[test]
    fn test_parse_slash_commands() {
        assert_eq!(parse_command("/help"), ChatCommand::Help);
        assert_eq!(parse_command("/quit"), ChatCommand::Quit);
        assert_eq!(parse_command("/exit"), ChatCommand::Quit);
        assert_eq!(parse_command("/rebuild"), ChatCommand::Rebuild);
        assert_eq!(parse_command("/stats"), ChatCommand::Stats);
    }

    #[test]
    fn test_parse_topk() {
        assert_eq!(parse_command("/topk 5"), ChatCommand::TopK(5));
        assert!(matches!(parse_command("/topk"), ChatCommand::Invalid(_)));
        assert!(matches!(parse_command("/topk 0"), ChatCommand::Invalid(_)));
        assert!(matches!(parse_command("/topk lots"), ChatCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_corpus_filter() {
        assert_eq!(
            parse_command("/corpus docs"),
            ChatCommand::CorpusFilter(Some(Corpus::Docs))
        );
        assert_eq!(
            parse_command("/corpus refs"),
            ChatCommand::CorpusFilter(Some(Corpus::Refs))
        );
        assert_eq!(parse_command("/corpus all"), ChatCommand::CorpusFilter(None));
        assert!(matches!(parse_command("/corpus web"), ChatCommand::Invalid(_)));
    }

    #[test]
    fn test_parse_empty_and_unknown() {
        assert_eq!(parse_command("   "), ChatCommand::Empty);
        assert!(matches!(parse_command("/frobnicate"), ChatCommand::Invalid(_)));
    }
}
