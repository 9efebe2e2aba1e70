//! `create` command: catalog -> embedding index.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use threatgraph_core::config::{constants, EmbeddingConfig};
use threatgraph_core::Result;
use threatgraph_embeddings::embedder_for;
use threatgraph_index::{build_index, load_catalog, IndexStore, TechniqueIndex};

use crate::error::{report, EXIT_ERROR, EXIT_OK};

/// Arguments for `threatgraph create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Path to the technique catalog bundle (JSON)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Output path for the persisted index
    #[arg(long)]
    pub output: PathBuf,

    /// Embedding model identity
    #[arg(long, env = "THREATGRAPH_MODEL", default_value = constants::DEFAULT_MODEL)]
    pub model: String,

    /// Overwrite an existing index
    #[arg(long)]
    pub force: bool,
}

/// Execute the create command.
pub async fn create_command(args: CreateArgs) -> i32 {
    let store = IndexStore::new(&args.output);
    if store.exists() && !args.force {
        eprintln!(
            "error: index already exists at {} (use --force to rebuild)",
            args.output.display()
        );
        return EXIT_ERROR;
    }

    match run(&args, &store).await {
        Ok(index) => {
            println!(
                "Indexed {} techniques ({}, dim {}) -> {}",
                index.len(),
                index.embedding_model,
                index.embedding_dim,
                args.output.display()
            );
            EXIT_OK
        }
        Err(e) => report(&e),
    }
}

async fn run(args: &CreateArgs, store: &IndexStore) -> Result<TechniqueIndex> {
    let catalog = load_catalog(&args.catalog)?;
    let embedder = embedder_for(&EmbeddingConfig::for_model(&args.model))?;
    info!(
        records = catalog.records.len(),
        model = embedder.id(),
        "building index"
    );
    let index = build_index(&catalog, embedder.as_ref()).await?;
    store.save(&index)?;
    Ok(index)
}
