//! Storage abstraction for Persona Context.
//!
//! The [`DocumentStore`] trait defines every storage operation the ingestion
//! and retrieval pipelines need, enabling pluggable backends: PostgreSQL
//! with pgvector in production, an in-memory map with brute-force cosine
//! similarity in tests.
//!
//! The store owns two schema invariants: every row's embedding has the
//! dimension the store was created with, and a row's lexical search vector
//! always reflects its current content (derived by the store, never written
//! by the application).

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{DocMetadata, ScoredDoc};

/// Abstract document store.
///
/// All operations are async (via `async-trait`). Upserts are idempotent by
/// construction — chunk ids are deterministic, so the same content maps to
/// the same row — and deletes are set-based, so no row-level locking is
/// needed.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](DocumentStore::upsert) | Insert or replace one chunk row |
/// | [`delete_by_ids`](DocumentStore::delete_by_ids) | Bulk delete, no-op for missing ids |
/// | [`list_all_ids`](DocumentStore::list_all_ids) | Primary-key scan for garbage collection |
/// | [`ids_for_source`](DocumentStore::ids_for_source) | Ids ingested from one source file |
/// | [`lexical_search`](DocumentStore::lexical_search) | Ranked full-text search |
/// | [`vector_search`](DocumentStore::vector_search) | Ranked similarity search |
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new row or replace `content`, `embedding`, and `metadata`
    /// in place when `id` already exists. The lexical search vector is
    /// recomputed by the store as a consequence.
    ///
    /// Rejects embeddings whose length differs from the store's configured
    /// dimension; persisting one would poison similarity search.
    async fn upsert(
        &self,
        id: Uuid,
        content: &str,
        embedding: &[f32],
        metadata: &DocMetadata,
    ) -> Result<()>;

    /// Remove rows whose id is in `ids`. Ids that don't exist are ignored.
    /// Returns the number of rows actually deleted.
    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64>;

    /// Full scan of primary keys, used by the ingestion pipeline's
    /// garbage-collection step.
    async fn list_all_ids(&self) -> Result<Vec<Uuid>>;

    /// Ids of all rows ingested from the given source file. Used to shield
    /// a file that failed processing this run from garbage collection.
    async fn ids_for_source(&self, source_file: &str) -> Result<Vec<Uuid>>;

    /// Rank rows whose search vector matches `query`, restricted to rows
    /// visible to `persona_id` (exact match or the global wildcard).
    /// Returns at most `limit` rows, best first.
    async fn lexical_search(
        &self,
        query: &str,
        persona_id: &str,
        limit: i64,
    ) -> Result<Vec<ScoredDoc>>;

    /// Rank rows by similarity (1 − distance) to `query_embedding`, same
    /// scope filter as [`lexical_search`](DocumentStore::lexical_search).
    /// Returns at most `limit` rows, most similar first.
    async fn vector_search(
        &self,
        query_embedding: &[f32],
        persona_id: &str,
        limit: i64,
    ) -> Result<Vec<ScoredDoc>>;
}
