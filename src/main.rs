//! commrag binary entry point

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::{Duration, Instant};

use commrag::answer::{Answerer, OllamaClient};
use commrag::cli::{Args, Commands, Verbosity};
use commrag::config::Config;
use commrag::doctor::{Doctor, HealthStatus};
use commrag::errors::RagError;
use commrag::eval::{load_cases, EvalHarness};
use commrag::index::CorpusStore;
use commrag::ingest::CorpusLoader;
use commrag::rag::context::ContextConfig;
use commrag::rag::pipeline::PipelineConfig;
use commrag::rag::rerank::ReRankConfig;
use commrag::rag::retrieval::SearchParams;
use commrag::rag::RagPipeline;
use commrag::repl::ChatSession;
use commrag::telemetry::{StageEvent, TelemetryCollector};
use commrag::types::Corpus;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        if let Some(RagError::SafetyBlocked(reason)) = e.downcast_ref::<RagError>() {
            eprintln!("{} query blocked: {}", "!".yellow(), reason);
        } else {
            eprintln!("{} {:#}", "error:".red(), e);
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path.clone())?,
        None => Config::load()?,
    };
    args.apply_to(&mut config);

    let verbosity = args.verbosity();
    let corpus = args
        .corpus_filter()
        .map_err(|message| anyhow::anyhow!(message))?;

    match &args.command {
        Commands::Index => cmd_index(&config, verbosity).await,
        Commands::Ask { question } => cmd_ask(&config, verbosity, corpus, question).await,
        Commands::Search { query } => cmd_search(&config, verbosity, corpus, query).await,
        Commands::Chat => cmd_chat(&config, verbosity, corpus).await,
        Commands::Stats => cmd_stats(&config).await,
        Commands::Eval { file, out } => {
            cmd_eval(&config, verbosity, corpus, file, out.as_deref()).await
        }
        Commands::Doctor => cmd_doctor(&config).await,
        Commands::Config => cmd_config(&args, &config),
    }
}

/// Spinner shown while the embedding model loads and Qdrant connects
fn spinner(verbosity: Verbosity, message: &str) -> Option<ProgressBar> {
    if !verbosity.show_progress() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    Some(bar)
}

fn finish(bar: Option<ProgressBar>) {
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
}

async fn open_store(config: &Config, verbosity: Verbosity) -> Result<Arc<CorpusStore>> {
    let bar = spinner(verbosity, "loading embedding model...");
    let store = CorpusStore::new(&config.paths.qdrant_url, &config.models.embedding_model)
        .await
        .context("Failed to open corpus store. Is Qdrant running? Try: commrag doctor")?;
    finish(bar);
    Ok(Arc::new(store))
}

fn make_loader(config: &Config) -> CorpusLoader {
    CorpusLoader::new(
        &config.paths.data_dir,
        config.retrieval.chunk_chars,
        config.retrieval.chunk_overlap,
    )
}

fn make_params(config: &Config, corpus: Option<Corpus>) -> SearchParams {
    SearchParams {
        top_k: config.retrieval.top_k,
        threshold: config.retrieval.threshold,
        corpus,
    }
}

fn make_pipeline(store: Arc<CorpusStore>, config: &Config, corpus: Option<Corpus>) -> RagPipeline {
    RagPipeline::with_config(
        store,
        PipelineConfig {
            search: make_params(config, corpus),
            rerank: ReRankConfig::default(),
            context: ContextConfig {
                max_context_tokens: config.retrieval.max_context_tokens,
                ..ContextConfig::default()
            },
            safety: config.safety.clone(),
        },
    )
}

fn make_answerer(config: &Config) -> Result<Answerer> {
    let client = OllamaClient::with_config(&config.models.ollama_url, &config.models.answer_model)?;
    Ok(Answerer::new(client))
}

async fn cmd_index(config: &Config, verbosity: Verbosity) -> Result<()> {
    let telemetry = TelemetryCollector::new();
    let store = open_store(config, verbosity).await?;
    let loader = make_loader(config);

    let bar = spinner(verbosity, "indexing corpora...");
    let start = Instant::now();
    let summary = store.rebuild(&loader).await?;
    finish(bar);

    telemetry.record(StageEvent::IngestCompleted {
        files: summary.files_read,
        chunks: summary.chunks_indexed,
        duration: summary.ingest_time,
    });
    telemetry.record(StageEvent::EmbedCompleted {
        chunks: summary.chunks_indexed,
        duration: summary.index_time,
    });

    for warning in &summary.warnings {
        eprintln!("{} {}", "warning:".yellow(), warning);
    }
    println!(
        "{} {} chunks from {} files in {:.1}s",
        "indexed".green().bold(),
        summary.chunks_indexed,
        summary.files_read,
        start.elapsed().as_secs_f32()
    );
    if verbosity.show_telemetry() {
        let stats = telemetry.stats();
        eprintln!(
            "{}",
            format!(
                "files: {}, chunks: {}, ingest: {:.1}s, embed+store: {:.1}s",
                stats.files_ingested,
                stats.chunks_indexed,
                summary.ingest_time.as_secs_f32(),
                summary.index_time.as_secs_f32()
            )
            .dimmed()
        );
    }

    Ok(())
}

async fn cmd_ask(
    config: &Config,
    verbosity: Verbosity,
    corpus: Option<Corpus>,
    question: &str,
) -> Result<()> {
    let telemetry = TelemetryCollector::new();
    let store = open_store(config, verbosity).await?;
    let pipeline = make_pipeline(store, config, corpus);
    let answerer = make_answerer(config)?;

    let bar = spinner(verbosity, "retrieving...");
    let search_start = Instant::now();
    let retrieval = pipeline.execute(question).await?;
    telemetry.record(StageEvent::SearchCompleted {
        hits: retrieval.passages_retrieved,
        dropped: retrieval.passages_dropped,
        duration: search_start.elapsed(),
    });

    if let Some(bar) = &bar {
        bar.set_message("generating answer...");
    }
    let generate_start = Instant::now();
    let answer = answerer.answer(&retrieval).await?;
    telemetry.record(StageEvent::GenerateCompleted {
        refused: answer.refused,
        citations: answer.citations.len(),
        duration: generate_start.elapsed(),
    });
    finish(bar);

    println!("{}", answer.text);
    if !answer.citations.is_empty() {
        println!("\n{}", "Sources:".bold());
        for citation in &answer.citations {
            println!("  {}", citation.label());
        }
    }
    if verbosity.show_telemetry() {
        eprintln!("{}", telemetry.summary().dimmed());
    }

    Ok(())
}

async fn cmd_search(
    config: &Config,
    verbosity: Verbosity,
    corpus: Option<Corpus>,
    query: &str,
) -> Result<()> {
    let store = open_store(config, verbosity).await?;
    let pipeline = make_pipeline(store, config, corpus);

    let result = pipeline.execute(query).await?;
    if result.passages.is_empty() {
        println!("no passages above threshold {}", config.retrieval.threshold);
        return Ok(());
    }

    for (rank, ranked) in result.passages.iter().enumerate() {
        println!(
            "{:>2}. {} {}",
            rank + 1,
            format!("{:.3}", ranked.reranked_score).cyan(),
            ranked.passage.label()
        );
        if verbosity.show_passages() {
            println!("    {}", ranked.passage.text.replace('\n', "\n    "));
        }
    }
    if result.passages_dropped > 0 {
        eprintln!(
            "{} {} passage(s) dropped by safety screening",
            "!".yellow(),
            result.passages_dropped
        );
    }

    Ok(())
}

async fn cmd_chat(config: &Config, verbosity: Verbosity, corpus: Option<Corpus>) -> Result<()> {
    let store = open_store(config, verbosity).await?;
    let pipeline = make_pipeline(store.clone(), config, corpus);
    let answerer = make_answerer(config)?;
    let loader = make_loader(config);
    let params = make_params(config, corpus);

    let mut session = ChatSession::new(store, pipeline, answerer, loader, params);
    session.run().await
}

async fn cmd_stats(config: &Config) -> Result<()> {
    let store = open_store(config, Verbosity::Quiet).await?;

    let mut total = 0;
    for corpus in Corpus::ALL {
        let count = store.stats(corpus).await?;
        println!("{:<6} {} points", format!("{}:", corpus), count);
        total += count;
    }
    println!("{:<6} {} points", "total:", total);

    Ok(())
}

async fn cmd_eval(
    config: &Config,
    verbosity: Verbosity,
    corpus: Option<Corpus>,
    file: &std::path::Path,
    out: Option<&std::path::Path>,
) -> Result<()> {
    let cases = load_cases(file)?;
    if cases.is_empty() {
        bail!("no cases in {}", file.display());
    }

    let store = open_store(config, verbosity).await?;
    let pipeline = make_pipeline(store, config, corpus);
    let answerer = make_answerer(config)?;
    let harness = EvalHarness::new(pipeline, answerer, config.models.answer_model.clone());

    let bar = spinner(verbosity, &format!("evaluating {} cases...", cases.len()));
    let start = Instant::now();
    let report = harness.run(&cases).await?;
    finish(bar);

    print!("{}", report.render_table());
    if verbosity.show_telemetry() {
        eprintln!(
            "{}",
            format!(
                "{} cases scored, {} skipped, elapsed: {:.1}s",
                report.cases.len(),
                report.warnings.len(),
                start.elapsed().as_secs_f32()
            )
            .dimmed()
        );
    }
    for warning in &report.warnings {
        eprintln!("{} {}", "warning:".yellow(), warning);
    }

    if let Some(path) = out {
        report.save(path)?;
        println!("report written to {}", path.display());
    }

    Ok(())
}

async fn cmd_doctor(config: &Config) -> Result<()> {
    let doctor = Doctor::new(config.clone());
    let checks = doctor.run_all().await;

    for check in &checks {
        let symbol = match check.status {
            HealthStatus::Pass => check.status.symbol().green(),
            HealthStatus::Warn => check.status.symbol().yellow(),
            HealthStatus::Fail => check.status.symbol().red(),
        };
        println!("{} {:<16} {}", symbol, check.name, check.detail);
    }

    if !Doctor::healthy(&checks) {
        bail!("one or more checks failed");
    }
    Ok(())
}

fn cmd_config(args: &Args, config: &Config) -> Result<()> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
