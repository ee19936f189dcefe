//! Core data models used throughout Persona Context.
//!
//! These types represent the chunks, stored rows, and retrieval results that
//! flow through the ingestion and retrieval pipeline. Chunk identity is
//! deterministic: a UUID v5 derived from the chunk's source path, scope, and
//! index, so re-ingesting the same source reproduces the same id and the
//! store upsert overwrites in place instead of duplicating.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scope marker meaning "applies to every persona".
pub const GLOBAL_SCOPE: &str = "ALL";

/// Fixed namespace for chunk id derivation. Changing this orphans every
/// previously ingested row, forcing a full re-ingest.
pub const CHUNK_ID_NAMESPACE: Uuid = uuid::uuid!("1b671a64-40d5-491e-99b0-da01ff1f3341");

/// A bounded span of text extracted from one source document.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Relative path of the source file this chunk came from.
    pub source_path: String,
    /// Persona ids this chunk applies to, or `[GLOBAL_SCOPE]`.
    pub scope_ids: Vec<String>,
    /// Position within the source document, starting at 0.
    pub index: usize,
    pub text: String,
}

impl Chunk {
    /// Deterministic chunk identity over `(source_path, scope_ids, index)`.
    pub fn id(&self) -> Uuid {
        chunk_id(&self.source_path, &self.scope_ids, self.index)
    }

    pub fn metadata(&self) -> DocMetadata {
        DocMetadata {
            source_file: self.source_path.clone(),
            persona_ids: self.scope_ids.clone(),
        }
    }
}

/// Derive the persistent id for a chunk. UUID v5 in a fixed namespace, so
/// the same `(path, scope, index)` always maps to the same row.
pub fn chunk_id(source_path: &str, scope_ids: &[String], index: usize) -> Uuid {
    let name = format!("{}::{}::chunk{}", source_path, scope_ids.join("-"), index);
    Uuid::new_v5(&CHUNK_ID_NAMESPACE, name.as_bytes())
}

/// JSON metadata blob persisted alongside each document row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMetadata {
    pub source_file: String,
    pub persona_ids: Vec<String>,
}

impl DocMetadata {
    /// Whether a row with this metadata is visible to the given persona.
    pub fn matches_scope(&self, persona_id: &str) -> bool {
        self.persona_ids
            .iter()
            .any(|p| p == persona_id || p == GLOBAL_SCOPE)
    }
}

/// One ranked row returned by a single search channel (lexical or vector).
///
/// `score` is the backend's native ranking value: `ts_rank` for the lexical
/// channel, cosine similarity for the vector channel. The two are not
/// comparable; fusion is rank-based.
#[derive(Debug, Clone)]
pub struct ScoredDoc {
    pub id: Uuid,
    pub content: String,
    pub metadata: DocMetadata,
    pub score: f64,
}

/// A fused search result. `score` carries the original channel score for
/// diagnostic display; ordering was decided by rank fusion, not this value.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: Uuid,
    pub content: String,
    pub metadata: DocMetadata,
    pub score: f64,
}

/// A citation for one chunk included in assembled context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    pub source_file: String,
    pub persona_ids: Vec<String>,
}

/// The boundary type handed to the prompt-building layer.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaContext {
    pub assembled_context: String,
    pub cited_sources: Vec<Citation>,
}

impl PersonaContext {
    pub fn empty() -> Self {
        Self {
            assembled_context: String::new(),
            cited_sources: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_deterministic() {
        let a = chunk_id("data/personas/nutri.json", &["nutri".to_string()], 0);
        let b = chunk_id("data/personas/nutri.json", &["nutri".to_string()], 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_chunk_id_varies_by_index() {
        let a = chunk_id("data/personas/nutri.json", &["nutri".to_string()], 0);
        let b = chunk_id("data/personas/nutri.json", &["nutri".to_string()], 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_chunk_id_varies_by_scope() {
        let a = chunk_id("data/global/pricing.pdf", &[GLOBAL_SCOPE.to_string()], 0);
        let b = chunk_id("data/global/pricing.pdf", &["nutri".to_string()], 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_chunk_id_matches_struct_method() {
        let chunk = Chunk {
            source_path: "docs/a.txt".to_string(),
            scope_ids: vec!["a".to_string(), "b".to_string()],
            index: 3,
            text: "body".to_string(),
        };
        assert_eq!(
            chunk.id(),
            chunk_id("docs/a.txt", &["a".to_string(), "b".to_string()], 3)
        );
    }

    #[test]
    fn test_scope_matching() {
        let meta = DocMetadata {
            source_file: "x".to_string(),
            persona_ids: vec!["nutri".to_string()],
        };
        assert!(meta.matches_scope("nutri"));
        assert!(!meta.matches_scope("other"));

        let global = DocMetadata {
            source_file: "x".to_string(),
            persona_ids: vec![GLOBAL_SCOPE.to_string()],
        };
        assert!(global.matches_scope("nutri"));
        assert!(global.matches_scope("anything"));
    }
}
