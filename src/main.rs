//! CLI entry point for semantic document retrieval.
//!
//! Loads `{ "id": <int>, "text": <string> }` lines from a JSONL file, indexes
//! them in memory and prints ranked matches for a query as JSON.

use anyhow::{Context, Result, bail};
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use docsim::vector::texts_from_json;
use docsim::{DocumentId, FastEmbedProvider, SemanticRetriever, Settings, parse_threshold};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

#[derive(Parser)]
#[command(
    name = "docsim",
    version,
    about = "Rank documents by semantic similarity to a query",
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to a settings file (defaults to .docsim/settings.toml)
    #[arg(short, long, global = true, env = "DOCSIM_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        about = "Index a JSONL document file and search it",
        after_help = "Examples:\n  docsim search --docs resumes.jsonl \"rust backend engineer\"\n  docsim search --docs jobs.jsonl \"remote data analyst\" --top-k 10 --threshold 0.4\n  docsim search --docs jobs.jsonl \"line cook\" --threshold strong"
    )]
    Search {
        /// Query text
        query: String,

        /// JSONL file with one {"id", "text"} object per line
        #[arg(short, long)]
        docs: PathBuf,

        /// Number of results (defaults to search.default_top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum similarity: a number in 0..=1 or strong, moderate, loose
        /// (defaults to search.threshold)
        #[arg(short, long, value_parser = parse_threshold)]
        threshold: Option<f32>,
    },

    #[command(about = "Display the effective settings")]
    Config,
}

#[derive(Debug, Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    model: &'a str,
    documents: usize,
    elapsed_ms: u64,
    results: Vec<docsim::SearchResult>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load settings: {e}"))?;

    let level = if cli.verbose {
        "debug"
    } else {
        settings.logging.level.as_str()
    };
    docsim::logging::init(level);

    match cli.command {
        Commands::Search {
            query,
            docs,
            top_k,
            threshold,
        } => run_search(&settings, &query, &docs, top_k, threshold),
        Commands::Config => {
            print!("{}", settings.to_toml().context("Failed to render settings")?);
            Ok(())
        }
    }
}

fn run_search(
    settings: &Settings,
    query: &str,
    docs: &Path,
    top_k: Option<usize>,
    threshold: Option<f32>,
) -> Result<()> {
    let documents = read_documents(docs)?;
    let provider = Arc::new(FastEmbedProvider::from_config(&settings.embedding)?);
    let model = provider.model_name().to_string();
    let retriever = SemanticRetriever::with_config(provider, &settings.index);

    let started = Instant::now();
    let borrowed: Vec<(DocumentId, &str)> = documents
        .iter()
        .map(|(id, text)| (*id, text.as_str()))
        .collect();
    retriever
        .add_documents(&borrowed)
        .with_context(|| format!("Failed to index '{}'", docs.display()))?;

    let top_k = top_k.unwrap_or(settings.search.default_top_k);
    let results = match threshold.or(settings.search.threshold) {
        Some(min) => retriever.search_with_threshold(query, top_k, min)?,
        None => retriever.search(query, top_k)?,
    };

    let output = SearchOutput {
        query,
        model: &model,
        documents: retriever.len(),
        elapsed_ms: started.elapsed().as_millis() as u64,
        results,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Reads `{ "id", "text" }` objects, one per non-blank line.
fn read_documents(path: &Path) -> Result<Vec<(DocumentId, String)>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;

    let mut ids = Vec::new();
    let mut texts = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid JSON", path.display(), line_no + 1))?;
        let Some(id) = value.get("id").and_then(Value::as_i64) else {
            bail!("{}:{}: missing integer \"id\"", path.display(), line_no + 1);
        };
        ids.push(id);
        texts.push(value.get("text").cloned().unwrap_or(Value::Null));
    }

    let validated = texts_from_json(&texts)
        .with_context(|| format!("Invalid \"text\" field in '{}'", path.display()))?;
    Ok(ids
        .into_iter()
        .map(DocumentId::new)
        .zip(validated.into_iter().map(str::to_string))
        .collect())
}
