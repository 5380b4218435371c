//! Knowledge hub CLI
//!
//! Run with: cargo run -p knowledge-hub -- <command>

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use knowledge_hub::{config, HubConfig, KnowledgeHub, PathReport};

/// Ingest PDF and spreadsheet collections and retrieve prompt context
#[derive(Parser)]
#[command(name = "knowledge-hub", version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Client namespace, defaults to user@host
    #[arg(long, global = true)]
    client_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a file or a directory tree
    Ingest { path: PathBuf },

    /// Print the context retrieved for a query
    Context {
        collection: String,
        query: String,
        #[arg(long)]
        num_retrieve: Option<usize>,
        #[arg(long)]
        score_threshold: Option<f32>,
        /// Print the full chat prompt instead of the bare context
        #[arg(long)]
        prompt: bool,
    },

    /// List the client's collections
    Collections,

    /// Delete a collection and its records
    Clear { collection: String },

    /// Remove indexed chunks that have no ingestion record
    Reconcile { collection: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "knowledge_hub=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = HubConfig::load_or_default(cli.config.as_deref())?;
    let client_id = cli.client_id.unwrap_or_else(config::client_id);
    tracing::debug!("Client namespace: {}", client_id);

    let hub = KnowledgeHub::with_ollama(config)?;

    match cli.command {
        Commands::Ingest { path } => {
            if !hub.embedder().health_check().await? {
                tracing::warn!(
                    "Ollama not available at {}; start it with `ollama serve` and pull {}",
                    hub.config().ollama.base_url,
                    hub.config().ollama.embed_model
                );
            }

            match hub.add_folder_or_file(&client_id, &path).await? {
                PathReport::File {
                    collection,
                    outcome,
                    ..
                } => {
                    println!("{}: {:?}", collection, outcome);
                }
                PathReport::Directory(report) => {
                    println!(
                        "{}: {} file(s) ingested, {} chunk(s)",
                        report.collection,
                        report.ingested_files(),
                        report.total_chunks()
                    );
                    for (path, outcome) in &report.outcomes {
                        println!("  {} {:?}", path.display(), outcome);
                    }
                    for failure in &report.failures {
                        println!("  {} skipped: {}", failure.path.display(), failure.reason);
                    }
                }
            }
        }
        Commands::Context {
            collection,
            query,
            num_retrieve,
            score_threshold,
            prompt,
        } => {
            let defaults = hub.config().retrieval;
            let result = hub
                .get_context(
                    &client_id,
                    &collection,
                    &query,
                    num_retrieve.unwrap_or(defaults.num_retrieve),
                    score_threshold.unwrap_or(defaults.score_threshold),
                )
                .await?;

            eprintln!("{}", result.diagnostic);
            if prompt {
                println!("{}", result.augment_prompt(&query));
            } else {
                println!("{}", result.context);
            }
        }
        Commands::Collections => {
            for name in hub.list_collections(&client_id)? {
                println!("{}", name);
            }
        }
        Commands::Clear { collection } => {
            hub.clear_collection(&client_id, &collection).await?;
            println!("Cleared {}", collection);
        }
        Commands::Reconcile { collection } => {
            let report = hub.reconcile(&client_id, &collection).await?;
            println!(
                "Removed {} orphaned chunk(s) from {} source(s)",
                report.removed_entries,
                report.orphan_urls.len()
            );
            for url in report.orphan_urls {
                println!("  {}", url);
            }
        }
    }

    Ok(())
}
