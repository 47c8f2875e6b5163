use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use douggle_core::config::{DEFAULT_K_VALUES, DEFAULT_NAMESPACE, DEFAULT_TOP_K};
use douggle_core::evaluation::{evaluate, pseudo_relevant, EvalLog};
use douggle_core::source::load_folder;
use douggle_core::{EngineError, IdentityNormalizer, IndexCache, Language, Normalizer, SearchEngine, SearchHit, StemmingNormalizer};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, query and evaluate a TF-IDF document index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CollectionArgs {
    /// Folder of .txt documents
    #[arg(long, default_value = "./data")]
    input: String,
    /// Index cache directory
    #[arg(long, default_value = "./cache")]
    cache: String,
    /// Cache namespace
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,
    /// Stopword list and stemmer: indonesian or english
    #[arg(long, default_value = "indonesian")]
    language: Language,
    /// Treat documents as already normalized (whitespace tokenization only)
    #[arg(long, default_value_t = false)]
    identity: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index, reusing the cache when the collection is unchanged
    Build {
        #[command(flatten)]
        collection: CollectionArgs,
        /// Drop the cached snapshot first
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Rank documents against a query
    Search {
        #[command(flatten)]
        collection: CollectionArgs,
        /// Free-text query
        #[arg(short, long)]
        query: String,
        #[arg(short, long, default_value_t = DEFAULT_TOP_K)]
        k: usize,
    },
    /// Score retrieval against relevance judgments and log the run
    Evaluate {
        #[command(flatten)]
        collection: CollectionArgs,
        /// Single query to evaluate
        #[arg(short, long)]
        query: Option<String>,
        /// Comma-separated relevant document identifiers for --query
        #[arg(long, value_delimiter = ',')]
        relevant: Vec<String>,
        /// Without --relevant, judge the top N hits of the query as relevant
        #[arg(long, default_value_t = 3)]
        pseudo_top: usize,
        /// JSON file with a list of {"query": ..., "relevant": [...]} items
        #[arg(long)]
        queries: Option<String>,
        /// Cutoffs to report
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_K_VALUES)]
        k: Vec<usize>,
        /// Directory of evaluation records
        #[arg(long, default_value = "./eval_logs")]
        log_dir: String,
    },
    /// List logged evaluation runs, newest first
    Runs {
        #[arg(long, default_value = "./eval_logs")]
        log_dir: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print collection statistics
    Stats {
        #[command(flatten)]
        collection: CollectionArgs,
    },
    /// Delete every cached artifact in a namespace
    Invalidate {
        #[arg(long, default_value = "./cache")]
        cache: String,
        #[arg(long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
    },
}

#[derive(Debug, Deserialize)]
struct JudgedQuery {
    query: String,
    relevant: Vec<String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { collection, force } => build(&collection, force),
        Commands::Search { collection, query, k } => search(&collection, &query, k),
        Commands::Evaluate { collection, query, relevant, pseudo_top, queries, k, log_dir } => {
            run_evaluation(&collection, query, relevant, pseudo_top, queries, &k, &log_dir)
        }
        Commands::Runs { log_dir, limit } => list_runs(&log_dir, limit),
        Commands::Stats { collection } => stats(&collection),
        Commands::Invalidate { cache, namespace } => {
            IndexCache::open(&cache, &namespace)?.invalidate()?;
            println!("invalidated namespace {namespace} in {cache}");
            Ok(())
        }
    }
}

fn normalizer(args: &CollectionArgs) -> Arc<dyn Normalizer> {
    if args.identity {
        Arc::new(IdentityNormalizer)
    } else {
        Arc::new(StemmingNormalizer::for_language(args.language))
    }
}

/// Loads and indexes the collection. `None` is the empty state, already reported.
fn open_engine(args: &CollectionArgs, force: bool) -> Result<Option<SearchEngine>> {
    let loaded = match load_folder(&args.input) {
        Ok(l) => l,
        Err(EngineError::Input(msg)) => {
            println!("no documents: {msg}");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }
    if loaded.documents.is_empty() {
        println!("no documents: every file in {} was empty or unreadable", args.input);
        return Ok(None);
    }

    let cache = IndexCache::open(&args.cache, &args.namespace)?;
    if force {
        cache.invalidate()?;
    }
    let engine = SearchEngine::open(&cache, loaded.documents, normalizer(args))?;
    tracing::info!(
        num_docs = engine.num_docs(),
        cached = engine.was_cached(),
        normalizer = engine.normalizer().name(),
        "index ready"
    );
    Ok(Some(engine))
}

fn build(args: &CollectionArgs, force: bool) -> Result<()> {
    let Some(engine) = open_engine(args, force)? else { return Ok(()) };
    let snapshot = engine.snapshot();
    println!(
        "{} documents, {} terms ({})",
        snapshot.num_docs(),
        snapshot.vocabulary().len(),
        if engine.was_cached() { "loaded from cache" } else { "built" }
    );
    Ok(())
}

fn search(args: &CollectionArgs, query: &str, k: usize) -> Result<()> {
    let Some(engine) = open_engine(args, false)? else { return Ok(()) };
    let hits = engine.search(query, k);
    if hits.iter().all(|h| h.score == 0.0) {
        println!("no matching documents for {query:?}");
        return Ok(());
    }
    for (rank, hit) in hits.iter().filter(|h| h.score > 0.0).enumerate() {
        println!("{:>3}. {:.4}  {}", rank + 1, hit.score, hit.doc_id);
    }
    Ok(())
}

fn retrieved_ids(hits: &[SearchHit]) -> Vec<String> {
    hits.iter().filter(|h| h.score > 0.0).map(|h| h.doc_id.clone()).collect()
}

fn run_evaluation(
    args: &CollectionArgs,
    query: Option<String>,
    relevant: Vec<String>,
    pseudo_top: usize,
    queries: Option<String>,
    k_values: &[usize],
    log_dir: &str,
) -> Result<()> {
    let judged: Vec<(String, Option<HashSet<String>>)> = match (queries, query) {
        (Some(path), _) => {
            let items: Vec<JudgedQuery> = serde_json::from_str(&fs::read_to_string(path)?)?;
            items.into_iter().map(|j| (j.query, Some(j.relevant.into_iter().collect()))).collect()
        }
        (None, Some(q)) if !relevant.is_empty() => vec![(q, Some(relevant.into_iter().collect()))],
        (None, Some(q)) => vec![(q, None)],
        (None, None) => bail!("pass --query or --queries"),
    };

    let Some(engine) = open_engine(args, false)? else { return Ok(()) };
    let log = EvalLog::new(log_dir);
    let mut retrieved_lists = Vec::with_capacity(judged.len());
    let mut relevant_lists = Vec::with_capacity(judged.len());

    for (query, judgment) in judged {
        let hits = engine.search_all(&query);
        let relevant = judgment.unwrap_or_else(|| pseudo_relevant(&hits, pseudo_top));
        let retrieved = retrieved_ids(&hits);
        let report = evaluate(&[retrieved.clone()], &[relevant.clone()], k_values)?;
        let id = log.record_run(&query, &retrieved, &relevant, &report)?;
        println!("{query:?}: AP={:.4} -> {}", report.map, id);
        retrieved_lists.push(retrieved);
        relevant_lists.push(relevant);
    }

    let report = evaluate(&retrieved_lists, &relevant_lists, k_values)?;
    println!("{} queries, MAP={:.4}", report.queries, report.map);
    for (k, m) in &report.per_k {
        println!("  @{k:<3} P={:.4} R={:.4} F1={:.4}", m.precision_avg, m.recall_avg, m.f1_avg);
    }
    Ok(())
}

fn list_runs(log_dir: &str, limit: usize) -> Result<()> {
    let log = EvalLog::new(log_dir);
    let records = log.list_records()?;
    if records.is_empty() {
        println!("no evaluation runs in {}", log.root().display());
    }
    for stored in records.iter().take(limit) {
        let r = &stored.record;
        println!(
            "{}  {}  {:?}  MAP={:.4}  relevant {}/{} retrieved {}",
            r.timestamp, stored.id, r.query, r.metrics.map, r.summary.relevant_retrieved, r.summary.relevant, r.summary.retrieved
        );
    }
    Ok(())
}

fn stats(args: &CollectionArgs) -> Result<()> {
    let Some(engine) = open_engine(args, false)? else { return Ok(()) };
    println!("{}", serde_json::to_string_pretty(&engine.stats())?);
    println!("vocabulary: {} terms", engine.snapshot().vocabulary().len());
    Ok(())
}
