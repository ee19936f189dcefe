//! Hybrid search: lexical + vector retrieval fused by reciprocal rank.
//!
//! Each query is embedded once, then the lexical and vector channels run
//! concurrently against the store. The two ranked lists are fused with
//! Reciprocal Rank Fusion: every result at 1-indexed rank `r` scores
//! `1 / (k + r)`, and an id appearing in both lists keeps the **higher** of
//! its two fusion scores rather than the sum — final rank reflects how well
//! a document did in its best channel, instead of rewarding mere presence
//! in both.
//!
//! If the query embedding fails, the whole retrieval fails closed; callers
//! that prefer degrading to empty context use [`retrieve`], which logs the
//! error and returns an empty [`PersonaContext`].

use std::collections::HashMap;

use anyhow::Result;
use tracing::error;
use uuid::Uuid;

use crate::config::RetrievalConfig;
use crate::context::assemble_context;
use crate::embedding::Embedder;
use crate::models::{PersonaContext, ScoredDoc, SearchResult};
use crate::store::DocumentStore;

/// Rank-fusion constant. Dampens the gap between top ranks so a rank-1/
/// rank-2 split doesn't dominate the merged ordering.
pub const RRF_K: f64 = 60.0;

/// Run a hybrid (lexical + vector) search scoped to one persona.
///
/// Returns at most `top_k` fused results, best first. Each result carries
/// its original channel score for diagnostics; ordering is decided by rank
/// fusion alone.
pub async fn hybrid_search(
    store: &dyn DocumentStore,
    embedder: &dyn Embedder,
    query: &str,
    persona_id: &str,
    top_k: i64,
) -> Result<Vec<SearchResult>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let query_embedding = embedder.embed_one(query).await?;

    // The two channels are independent; issue them together.
    let (lexical, vector) = tokio::try_join!(
        store.lexical_search(query, persona_id, top_k),
        store.vector_search(&query_embedding, persona_id, top_k),
    )?;

    Ok(fuse(lexical, vector, top_k as usize))
}

/// Merge two ranked lists with max-score Reciprocal Rank Fusion.
fn fuse(lexical: Vec<ScoredDoc>, vector: Vec<ScoredDoc>, top_k: usize) -> Vec<SearchResult> {
    struct Fused {
        fusion_score: f64,
        doc: ScoredDoc,
    }

    let mut ranked: HashMap<Uuid, Fused> = HashMap::new();

    for list in [lexical, vector] {
        for (index, doc) in list.into_iter().enumerate() {
            let rank = index + 1;
            let score = 1.0 / (RRF_K + rank as f64);
            match ranked.entry(doc.id) {
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    // Keep the better channel's rank, not the sum.
                    if score > entry.get().fusion_score {
                        entry.get_mut().fusion_score = score;
                        entry.get_mut().doc = doc;
                    }
                }
                std::collections::hash_map::Entry::Vacant(entry) => {
                    entry.insert(Fused {
                        fusion_score: score,
                        doc,
                    });
                }
            }
        }
    }

    let mut fused: Vec<Fused> = ranked.into_values().collect();
    // Sort: fusion score desc, id asc (deterministic).
    fused.sort_by(|a, b| {
        b.fusion_score
            .partial_cmp(&a.fusion_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.doc.id.cmp(&b.doc.id))
    });
    fused.truncate(top_k);

    fused
        .into_iter()
        .map(|f| SearchResult {
            id: f.doc.id,
            content: f.doc.content,
            metadata: f.doc.metadata,
            score: f.doc.score,
        })
        .collect()
}

/// The boundary consumed by the persona-context assembly layer.
///
/// Runs a hybrid search for `query` scoped to `persona_id` and assembles
/// the results into one bounded context string with citations. A retrieval
/// failure (embedding provider down, store unreachable) is logged and
/// yields an empty context: the persona answers ungrounded rather than the
/// request failing outright.
pub async fn retrieve(
    store: &dyn DocumentStore,
    embedder: &dyn Embedder,
    retrieval: &RetrievalConfig,
    persona_id: &str,
    query: &str,
) -> PersonaContext {
    let results = match hybrid_search(store, embedder, query, persona_id, retrieval.top_k).await {
        Ok(results) => results,
        Err(e) => {
            error!(persona = persona_id, error = %e, "hybrid search failed, returning empty context");
            return PersonaContext::empty();
        }
    };

    assemble_context(&results, retrieval.max_context_chars)
}
