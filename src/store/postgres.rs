//! PostgreSQL [`DocumentStore`] backed by pgvector and tsvector.
//!
//! One table, `documents`, holds a row per chunk: deterministic UUID
//! primary key, raw content, a pgvector embedding, JSONB metadata, and a
//! generated `search_vector` column the database keeps in sync with
//! `content`. Lexical ranking uses `ts_rank` over `websearch_to_tsquery`;
//! vector ranking uses cosine distance served by an HNSW index.

use anyhow::{bail, Result};
use async_trait::async_trait;
use pgvector::Vector;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{DocMetadata, ScoredDoc};

use super::DocumentStore;

pub struct PgDocumentStore {
    pool: PgPool,
    dims: usize,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, dims: usize) -> Self {
        Self { pool, dims }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn row_to_scored(row: &sqlx::postgres::PgRow) -> Result<ScoredDoc> {
    let metadata: serde_json::Value = row.try_get("metadata")?;
    let metadata: DocMetadata = serde_json::from_value(metadata)?;
    Ok(ScoredDoc {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        metadata,
        score: row.try_get("score")?,
    })
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn upsert(
        &self,
        id: Uuid,
        content: &str,
        embedding: &[f32],
        metadata: &DocMetadata,
    ) -> Result<()> {
        if embedding.len() != self.dims {
            bail!(
                "embedding dimension mismatch: expected {}, got {}",
                self.dims,
                embedding.len()
            );
        }

        sqlx::query(
            r#"
            INSERT INTO documents (id, content, embedding, metadata)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                content = EXCLUDED.content,
                embedding = EXCLUDED.embedding,
                metadata = EXCLUDED.metadata
            "#,
        )
        .bind(id)
        .bind(content)
        .bind(Vector::from(embedding.to_vec()))
        .bind(serde_json::to_value(metadata)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM documents WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_all_ids(&self) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM documents")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn ids_for_source(&self, source_file: &str) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM documents WHERE metadata->>'source_file' = $1")
                .bind(source_file)
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }

    async fn lexical_search(
        &self,
        query: &str,
        persona_id: &str,
        limit: i64,
    ) -> Result<Vec<ScoredDoc>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content, metadata,
                   ts_rank(search_vector, websearch_to_tsquery('english', $1))::float8 AS score
            FROM documents
            WHERE search_vector @@ websearch_to_tsquery('english', $1)
              AND (metadata->'persona_ids' ? $2 OR metadata->'persona_ids' ? 'ALL')
            ORDER BY score DESC
            LIMIT $3
            "#,
        )
        .bind(query)
        .bind(persona_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_scored).collect()
    }

    async fn vector_search(
        &self,
        query_embedding: &[f32],
        persona_id: &str,
        limit: i64,
    ) -> Result<Vec<ScoredDoc>> {
        if query_embedding.len() != self.dims {
            bail!(
                "query embedding dimension mismatch: expected {}, got {}",
                self.dims,
                query_embedding.len()
            );
        }

        // ORDER BY the distance operator directly so the HNSW index serves
        // the scan; the similarity column is derived for the caller.
        let rows = sqlx::query(
            r#"
            SELECT id, content, metadata,
                   (1 - (embedding <=> $1))::float8 AS score
            FROM documents
            WHERE metadata->'persona_ids' ? $2 OR metadata->'persona_ids' ? 'ALL'
            ORDER BY embedding <=> $1
            LIMIT $3
            "#,
        )
        .bind(Vector::from(query_embedding.to_vec()))
        .bind(persona_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_scored).collect()
    }
}
