//! `match` command: rank techniques for query strings.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, ValueEnum};
use serde_json::json;

use threatgraph_core::config::{constants, EmbeddingConfig, MatchConfig};
use threatgraph_core::types::{MatchQuery, TechniqueMatch};
use threatgraph_core::Result;
use threatgraph_embeddings::embedder_for;
use threatgraph_index::{IndexStore, TechniqueMatcher};

use crate::error::{report, EXIT_ERROR, EXIT_OK};

/// Output rendering for match results.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable ranked lines.
    Text,
    /// One JSON document on stdout.
    Json,
}

/// Arguments for `threatgraph match`.
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Path to the persisted index
    #[arg(long, env = "THREATGRAPH_INDEX")]
    pub index: PathBuf,

    /// Ranked matches to return per query
    #[arg(long, default_value_t = constants::DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Floor on the adjusted score; below it a query returns no matches
    #[arg(long, default_value_t = constants::DEFAULT_MIN_SIMILARITY)]
    pub min_similarity: f32,

    /// Domain context tag applied to every query (e.g. a tactic name)
    #[arg(long)]
    pub context: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Query strings to match
    #[arg(required = true)]
    pub queries: Vec<String>,
}

/// Execute the match command.
///
/// Per-query failures are reported alongside successes; the exit code is
/// nonzero only when construction fails or every query fails.
pub async fn match_command(args: MatchArgs) -> i32 {
    let (queries, results) = match run(&args).await {
        Ok(pair) => pair,
        Err(e) => return report(&e),
    };

    match args.format {
        OutputFormat::Json => print_json(&queries, &results),
        OutputFormat::Text => print_text(&queries, &results),
    }

    if results.iter().all(|r| r.is_err()) {
        // Every query failed; surface the worst exit code among them.
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.exit_code())
            .max()
            .unwrap_or(EXIT_ERROR)
    } else {
        EXIT_OK
    }
}

type BatchResults = Vec<Result<Vec<TechniqueMatch>>>;

async fn run(args: &MatchArgs) -> Result<(Vec<MatchQuery>, BatchResults)> {
    let index = IndexStore::new(&args.index).load()?;
    // Reconstruct the provider this index was built with; the matcher
    // re-validates the identity on construction.
    let embedder = embedder_for(&EmbeddingConfig::for_model(&index.embedding_model))?;
    let matcher = TechniqueMatcher::new(Arc::new(index), embedder, MatchConfig::default())?;

    let queries: Vec<MatchQuery> = args
        .queries
        .iter()
        .map(|text| {
            let query = MatchQuery::new(text.clone());
            match &args.context {
                Some(ctx) => query.with_context(ctx.clone()),
                None => query,
            }
        })
        .collect();

    let results = matcher
        .match_batch(&queries, args.top_k, args.min_similarity)
        .await;
    Ok((queries, results))
}

fn print_text(queries: &[MatchQuery], results: &BatchResults) {
    for (query, result) in queries.iter().zip(results) {
        println!("query: {}", query.text);
        match result {
            Ok(matches) if matches.is_empty() => println!("  (no matches)"),
            Ok(matches) => {
                for m in matches {
                    println!(
                        "  {}. {}  {}  score={:.3} raw={:.3} ({})",
                        m.rank + 1,
                        m.technique_id,
                        m.name,
                        m.score,
                        m.similarity,
                        m.confidence
                    );
                }
            }
            Err(e) => println!("  error: {e}"),
        }
    }
}

fn print_json(queries: &[MatchQuery], results: &BatchResults) {
    let entries: Vec<serde_json::Value> = queries
        .iter()
        .zip(results)
        .map(|(query, result)| match result {
            Ok(matches) => json!({ "query": query.text, "matches": matches }),
            Err(e) => json!({ "query": query.text, "error": e.to_string() }),
        })
        .collect();
    println!(
        "{}",
        serde_json::to_string_pretty(&entries).unwrap_or_else(|_| "[]".to_string())
    );
}
