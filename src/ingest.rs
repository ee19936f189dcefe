//! Ingestion pipeline orchestration.
//!
//! Coordinates the full batch sync: walk source roots → extract text per
//! format → chunk → embed → upsert → garbage-collect stale rows. The run is
//! idempotent: chunk ids are deterministic, so identical source content
//! re-embeds to the same rows and overwrites in place with no duplication.
//!
//! A single file's extraction or embedding failure is logged and the file
//! is skipped; it never aborts the run. Skipped files are also shielded
//! from the garbage-collection step, so a transient failure cannot prune
//! content whose source still exists. Only rows whose source was absent
//! from (or no longer produces chunks in) the enumerated tree are deleted.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::extract::extract_file;
use crate::models::Chunk;
use crate::store::DocumentStore;

/// Summary of one ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub files_seen: usize,
    pub files_failed: usize,
    pub chunks_upserted: u64,
    pub stale_deleted: u64,
}

/// Run a full-corpus sync between the configured source roots and the store.
///
/// With `dry_run` set, files are enumerated, extracted, and chunked, but
/// nothing is embedded, written, or deleted.
pub async fn run_ingest(
    config: &Config,
    store: &dyn DocumentStore,
    embedder: &dyn Embedder,
    dry_run: bool,
) -> Result<IngestReport> {
    let mut report = IngestReport::default();

    // Ids produced by this run, and sources that failed processing. Both
    // are local to the invocation so overlapping runs would stay isolated.
    let mut run_ids: HashSet<Uuid> = HashSet::new();
    let mut failed_sources: Vec<String> = Vec::new();

    for root in &config.sources.roots {
        if !root.path.exists() {
            warn!(root = %root.path.display(), "source root does not exist, skipping");
            continue;
        }

        for path in enumerate_files(&root.path) {
            let source_file = relative_source_path(&path);
            report.files_seen += 1;

            let text = match extract_file(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(file = %source_file, error = %e, "extraction failed, skipping file");
                    failed_sources.push(source_file);
                    report.files_failed += 1;
                    continue;
                }
            };

            let texts = chunk_text(&text, config.chunking.chunk_size, config.chunking.chunk_overlap);
            let chunks: Vec<Chunk> = texts
                .into_iter()
                .enumerate()
                .map(|(index, text)| Chunk {
                    source_path: source_file.clone(),
                    scope_ids: root.personas.clone(),
                    index,
                    text,
                })
                .collect();

            if dry_run {
                report.chunks_upserted += chunks.len() as u64;
                continue;
            }

            // Embed every chunk of the file before writing anything, so a
            // mid-file embedding failure leaves no partial rows and the
            // file's previous chunks survive garbage collection.
            let vectors = match embed_chunks(embedder, &chunks, config.embedding.batch_size).await {
                Ok(vectors) => vectors,
                Err(e) => {
                    warn!(file = %source_file, error = %e, "embedding failed, skipping file");
                    failed_sources.push(source_file);
                    report.files_failed += 1;
                    continue;
                }
            };

            for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
                let id = chunk.id();
                store
                    .upsert(id, &chunk.text, vector, &chunk.metadata())
                    .await?;
                run_ids.insert(id);
                report.chunks_upserted += 1;
            }

            info!(file = %source_file, chunks = chunks.len(), "ingested");
        }
    }

    if !dry_run {
        report.stale_deleted = collect_stale(store, &run_ids, &failed_sources).await?;
    }

    Ok(report)
}

/// Record source files relative to the working directory. Chunk ids hash
/// this path, so a store keyed on relative paths survives relocating the
/// deployment; absolute paths would orphan every row on a move.
fn relative_source_path(path: &Path) -> String {
    let cwd = std::env::current_dir().unwrap_or_default();
    pathdiff::diff_paths(path, &cwd)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

fn enumerate_files(root: &Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    // Deterministic processing order.
    files.sort();
    files
}

async fn embed_chunks(
    embedder: &dyn Embedder,
    chunks: &[Chunk],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        vectors.extend(embedder.embed_batch(&texts).await?);
    }
    Ok(vectors)
}

/// Delete rows not produced by this run, except rows belonging to sources
/// that were enumerated but failed processing — those keep their previously
/// stored content until a later run re-processes them.
async fn collect_stale(
    store: &dyn DocumentStore,
    run_ids: &HashSet<Uuid>,
    failed_sources: &[String],
) -> Result<u64> {
    let stored = store.list_all_ids().await?;
    let mut stale: Vec<Uuid> = stored
        .into_iter()
        .filter(|id| !run_ids.contains(id))
        .collect();

    if !failed_sources.is_empty() {
        let mut shielded: HashSet<Uuid> = HashSet::new();
        for source in failed_sources {
            shielded.extend(store.ids_for_source(source).await?);
        }
        stale.retain(|id| !shielded.contains(id));
    }

    store.delete_by_ids(&stale).await
}
