//! `enrich` command: rewrite attack-tree documents with technique ids.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::info;

use threatgraph_core::config::{constants, EmbeddingConfig, MatchConfig};
use threatgraph_core::Result;
use threatgraph_embeddings::embedder_for;
use threatgraph_enrich::TreeEnricher;
use threatgraph_index::{IndexStore, TechniqueMatcher};

use crate::error::{report, EXIT_ERROR, EXIT_OK};

/// Arguments for `threatgraph enrich`.
#[derive(Args, Debug)]
pub struct EnrichArgs {
    /// Path to the persisted index
    #[arg(long, env = "THREATGRAPH_INDEX")]
    pub index: PathBuf,

    /// Input document or directory of `.md` documents
    #[arg(long)]
    pub input: PathBuf,

    /// Output file, or output directory for directory runs
    #[arg(long)]
    pub output: PathBuf,

    /// Floor on the adjusted score for embedding a technique id
    #[arg(long, default_value_t = constants::DEFAULT_MIN_SIMILARITY)]
    pub min_similarity: f32,
}

/// Execute the enrich command.
pub async fn enrich_command(args: EnrichArgs) -> i32 {
    if !args.input.exists() {
        eprintln!("error: input path does not exist: {}", args.input.display());
        return EXIT_ERROR;
    }
    match run(&args).await {
        Ok(()) => EXIT_OK,
        Err(e) => report(&e),
    }
}

async fn run(args: &EnrichArgs) -> Result<()> {
    let index = IndexStore::new(&args.index).load()?;
    let embedder = embedder_for(&EmbeddingConfig::for_model(&index.embedding_model))?;
    let matcher = TechniqueMatcher::new(Arc::new(index), embedder, MatchConfig::default())?;
    let enricher = TreeEnricher::new(&matcher, args.min_similarity);

    if args.input.is_dir() {
        let stats = enricher.enrich_dir(&args.input, &args.output).await?;
        println!(
            "Enriched {} document(s), skipped {} -> {}",
            stats.enriched,
            stats.skipped,
            args.output.display()
        );
    } else {
        // A directory output keeps the original file name.
        let output = if args.output.is_dir() {
            let name = args
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            args.output.join(format!("enriched_{name}"))
        } else {
            args.output.clone()
        };
        enricher.enrich_file(&args.input, &output).await?;
        info!(output = %output.display(), "document enriched");
        println!("Enriched {} -> {}", args.input.display(), output.display());
    }
    Ok(())
}
