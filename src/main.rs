//! # Persona Context CLI (`pctx`)
//!
//! The `pctx` binary drives the offline side of the retrieval engine and
//! provides debugging access to the online side.
//!
//! ## Usage
//!
//! ```bash
//! pctx --config ./config/pctx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pctx init` | Create the pgvector schema and indexes |
//! | `pctx ingest` | Sync the configured source roots into the store |
//! | `pctx search "<query>" --persona <id>` | Run a hybrid search and print ranked results |
//! | `pctx retrieve <persona> "<query>"` | Print the assembled context a prompt would receive |
//!
//! Connection string comes from `[db] url` or `POSTGRES_URL`; the OpenAI
//! key from `OPENAI_API_KEY`. A `.env` file is honored.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use persona_context::{config, db, embedding, ingest, migrate, search};
use persona_context::store::postgres::PgDocumentStore;

/// Persona Context — hybrid retrieval engine grounding synthetic customer
/// personas in ingested documents.
#[derive(Parser)]
#[command(
    name = "pctx",
    about = "Persona Context — hybrid retrieval over an ingested persona knowledge base",
    version,
    long_about = "Persona Context ingests a tree of persona and global knowledge documents \
    (JSON, PDF, DOCX, plain text), chunks and embeds them into PostgreSQL, and serves \
    scope-filtered hybrid (lexical + vector) retrieval with reciprocal rank fusion."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/pctx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the pgvector extension, the documents table with its
    /// generated search vector, and the GIN/HNSW indexes. Idempotent.
    Init,

    /// Ingest the configured source roots.
    ///
    /// Walks each root, extracts and chunks every file, embeds the chunks,
    /// upserts them, and garbage-collects rows no longer produced by the
    /// source tree. Safe to re-run.
    Ingest {
        /// Show file and chunk counts without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a hybrid search and print ranked results.
    Search {
        /// The search query string.
        query: String,

        /// Persona scope to search within.
        #[arg(long)]
        persona: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Assemble persona context for a query, as the prompt layer would.
    Retrieve {
        /// Persona scope to retrieve for.
        persona: String,

        /// The retrieval query string.
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&cfg, &pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { dry_run } => {
            let pool = db::connect(&cfg).await?;
            let store = PgDocumentStore::new(pool, cfg.embedding.dims);
            let embedder = embedding::create_embedder(&cfg.embedding)?;
            let report = ingest::run_ingest(&cfg, &store, embedder.as_ref(), dry_run).await?;

            if dry_run {
                println!("ingest (dry-run)");
                println!("  files found: {}", report.files_seen);
                println!("  estimated chunks: {}", report.chunks_upserted);
            } else {
                println!("ingest");
                println!("  files processed: {}", report.files_seen - report.files_failed);
                println!("  files skipped: {}", report.files_failed);
                println!("  chunks upserted: {}", report.chunks_upserted);
                println!("  stale rows deleted: {}", report.stale_deleted);
                println!("ok");
            }
            store.pool().close().await;
        }
        Commands::Search {
            query,
            persona,
            limit,
        } => {
            let pool = db::connect(&cfg).await?;
            let store = PgDocumentStore::new(pool, cfg.embedding.dims);
            let embedder = embedding::create_embedder(&cfg.embedding)?;
            let top_k = limit.unwrap_or(cfg.retrieval.top_k);

            let results =
                search::hybrid_search(&store, embedder.as_ref(), &query, &persona, top_k).await?;

            if results.is_empty() {
                println!("No results.");
            } else {
                for (i, result) in results.iter().enumerate() {
                    let excerpt: String = result.content.chars().take(160).collect();
                    println!(
                        "{}. [{:.4}] {}",
                        i + 1,
                        result.score,
                        result.metadata.source_file
                    );
                    println!("    personas: {}", result.metadata.persona_ids.join(", "));
                    println!("    excerpt: \"{}\"", excerpt.replace('\n', " ").trim());
                    println!("    id: {}", result.id);
                    println!();
                }
            }
            store.pool().close().await;
        }
        Commands::Retrieve { persona, query } => {
            let pool = db::connect(&cfg).await?;
            let store = PgDocumentStore::new(pool, cfg.embedding.dims);
            let embedder = embedding::create_embedder(&cfg.embedding)?;

            let ctx = search::retrieve(&store, embedder.as_ref(), &cfg.retrieval, &persona, &query)
                .await;

            if ctx.assembled_context.is_empty() {
                println!("No context assembled.");
            } else {
                println!("{}", ctx.assembled_context);
                println!();
                println!("sources:");
                for citation in &ctx.cited_sources {
                    println!(
                        "  - {} ({})",
                        citation.source_file,
                        citation.persona_ids.join(", ")
                    );
                }
            }
            store.pool().close().await;
        }
    }

    Ok(())
}
