use anyhow::Result;
use sqlx::PgPool;

use crate::config::Config;

/// Create the pgvector extension, the `documents` table, and its indexes.
/// Idempotent: safe to run against an already-initialized database.
///
/// The `search_vector` column is generated from `content` by the database,
/// so lexical search stays consistent with the latest content without any
/// application bookkeeping. The HNSW index uses the cosine opclass to match
/// the `<=>` operator used at query time.
pub async fn run_migrations(config: &Config, pool: &PgPool) -> Result<()> {
    sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
        .execute(pool)
        .await?;

    // Dimension is fixed by the embedding model; changing it requires a
    // full re-ingest into a fresh table.
    let create_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id UUID PRIMARY KEY,
            content TEXT NOT NULL,
            embedding VECTOR({}) NOT NULL,
            metadata JSONB,
            search_vector TSVECTOR GENERATED ALWAYS AS (to_tsvector('english', content)) STORED
        )
        "#,
        config.embedding.dims
    );
    sqlx::query(&create_table).execute(pool).await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_metadata ON documents USING GIN (metadata)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_search_vector ON documents USING GIN (search_vector)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_embedding ON documents USING hnsw (embedding vector_cosine_ops)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
