//! In-memory [`DocumentStore`] implementation for testing.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety. Vector
//! search is brute-force cosine similarity over all stored embeddings;
//! lexical search ranks rows by the number of query terms they contain.
//! Result ordering ties break on id so tests are deterministic.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::embedding::cosine_similarity;
use crate::models::{DocMetadata, ScoredDoc};

use super::DocumentStore;

struct StoredRow {
    content: String,
    embedding: Vec<f32>,
    metadata: DocMetadata,
}

/// In-memory store for unit and integration tests.
pub struct InMemoryStore {
    rows: RwLock<HashMap<Uuid, StoredRow>>,
    dims: usize,
}

impl InMemoryStore {
    pub fn new(dims: usize) -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            dims,
        }
    }

    /// Row count, for assertions on idempotency.
    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Content of one row, for assertions on overwrite semantics.
    pub fn content_of(&self, id: &Uuid) -> Option<String> {
        self.rows.read().unwrap().get(id).map(|r| r.content.clone())
    }
}

fn sort_and_truncate(mut candidates: Vec<ScoredDoc>, limit: i64) -> Vec<ScoredDoc> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    candidates.truncate(limit.max(0) as usize);
    candidates
}

#[async_trait]
impl DocumentStore for InMemoryStore {
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
        let mut rows = self.rows.write().unwrap();
        rows.insert(
            id,
            StoredRow {
                content: content.to_string(),
                embedding: embedding.to_vec(),
                metadata: metadata.clone(),
            },
        );
        Ok(())
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64> {
        let mut rows = self.rows.write().unwrap();
        let mut deleted = 0u64;
        for id in ids {
            if rows.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn list_all_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.rows.read().unwrap().keys().copied().collect())
    }

    async fn ids_for_source(&self, source_file: &str) -> Result<Vec<Uuid>> {
        Ok(self
            .rows
            .read()
            .unwrap()
            .iter()
            .filter(|(_, row)| row.metadata.source_file == source_file)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn lexical_search(
        &self,
        query: &str,
        persona_id: &str,
        limit: i64,
    ) -> Result<Vec<ScoredDoc>> {
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.rows.read().unwrap();
        let candidates: Vec<ScoredDoc> = rows
            .iter()
            .filter(|(_, row)| row.metadata.matches_scope(persona_id))
            .filter_map(|(id, row)| {
                let content_lower = row.content.to_lowercase();
                let matches = terms.iter().filter(|t| content_lower.contains(*t)).count();
                if matches > 0 {
                    Some(ScoredDoc {
                        id: *id,
                        content: row.content.clone(),
                        metadata: row.metadata.clone(),
                        score: matches as f64,
                    })
                } else {
                    None
                }
            })
            .collect();

        Ok(sort_and_truncate(candidates, limit))
    }

    async fn vector_search(
        &self,
        query_embedding: &[f32],
        persona_id: &str,
        limit: i64,
    ) -> Result<Vec<ScoredDoc>> {
        let rows = self.rows.read().unwrap();
        let candidates: Vec<ScoredDoc> = rows
            .iter()
            .filter(|(_, row)| row.metadata.matches_scope(persona_id))
            .map(|(id, row)| ScoredDoc {
                id: *id,
                content: row.content.clone(),
                metadata: row.metadata.clone(),
                score: cosine_similarity(query_embedding, &row.embedding) as f64,
            })
            .collect();

        Ok(sort_and_truncate(candidates, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GLOBAL_SCOPE;

    fn meta(source: &str, persona: &str) -> DocMetadata {
        DocMetadata {
            source_file: source.to_string(),
            persona_ids: vec![persona.to_string()],
        }
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let store = InMemoryStore::new(2);
        let id = Uuid::new_v5(&crate::models::CHUNK_ID_NAMESPACE, b"row");
        store
            .upsert(id, "first", &[1.0, 0.0], &meta("a.txt", "p"))
            .await
            .unwrap();
        store
            .upsert(id, "second", &[0.0, 1.0], &meta("a.txt", "p"))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.content_of(&id).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = InMemoryStore::new(4);
        let id = Uuid::new_v5(&crate::models::CHUNK_ID_NAMESPACE, b"row");
        let err = store
            .upsert(id, "x", &[1.0, 0.0], &meta("a.txt", "p"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[tokio::test]
    async fn test_delete_ignores_missing_ids() {
        let store = InMemoryStore::new(1);
        let id = Uuid::new_v5(&crate::models::CHUNK_ID_NAMESPACE, b"row");
        store.upsert(id, "x", &[1.0], &meta("a.txt", "p")).await.unwrap();
        let ghost = Uuid::new_v5(&crate::models::CHUNK_ID_NAMESPACE, b"ghost");
        let deleted = store.delete_by_ids(&[id, ghost]).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_scope_isolation() {
        let store = InMemoryStore::new(1);
        let a = Uuid::new_v5(&crate::models::CHUNK_ID_NAMESPACE, b"a");
        let b = Uuid::new_v5(&crate::models::CHUNK_ID_NAMESPACE, b"b");
        store
            .upsert(a, "protein intake", &[1.0], &meta("a.txt", "nutri"))
            .await
            .unwrap();
        store
            .upsert(b, "protein supplements", &[1.0], &meta("b.txt", GLOBAL_SCOPE))
            .await
            .unwrap();

        let results = store.lexical_search("protein", "nutri", 10).await.unwrap();
        assert_eq!(results.len(), 2);

        // The other persona only sees the global row.
        let results = store.lexical_search("protein", "other", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, b);

        let results = store.vector_search(&[1.0], "other", 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, b);
    }

    #[tokio::test]
    async fn test_vector_search_orders_by_similarity() {
        let store = InMemoryStore::new(2);
        let near = Uuid::new_v5(&crate::models::CHUNK_ID_NAMESPACE, b"near");
        let far = Uuid::new_v5(&crate::models::CHUNK_ID_NAMESPACE, b"far");
        store
            .upsert(near, "near", &[1.0, 0.0], &meta("a.txt", "p"))
            .await
            .unwrap();
        store
            .upsert(far, "far", &[0.0, 1.0], &meta("b.txt", "p"))
            .await
            .unwrap();

        let results = store.vector_search(&[1.0, 0.1], "p", 10).await.unwrap();
        assert_eq!(results[0].id, near);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_ids_for_source() {
        let store = InMemoryStore::new(1);
        let a = Uuid::new_v5(&crate::models::CHUNK_ID_NAMESPACE, b"a");
        let b = Uuid::new_v5(&crate::models::CHUNK_ID_NAMESPACE, b"b");
        store.upsert(a, "x", &[1.0], &meta("a.txt", "p")).await.unwrap();
        store.upsert(b, "y", &[1.0], &meta("b.txt", "p")).await.unwrap();
        let ids = store.ids_for_source("a.txt").await.unwrap();
        assert_eq!(ids, vec![a]);
    }
}
