//! Context assembly under a character budget.
//!
//! Turns a ranked sequence of retrieved chunks into one bounded string for
//! prompt injection, plus citations for the chunks actually included.

use crate::models::{Citation, PersonaContext, SearchResult};

/// Accumulate chunk texts in rank order, separated by a blank line, stopping
/// at the first chunk that would push the total over `max_chars`. A chunk
/// either fits whole or ends the assembly — no partial truncation, and no
/// skipping ahead to a smaller chunk that would break rank order.
pub fn assemble_context(results: &[SearchResult], max_chars: usize) -> PersonaContext {
    let mut assembled = String::new();
    let mut assembled_chars = 0usize;
    let mut cited = Vec::new();

    for result in results {
        // The budget is in characters, matching the chunker's windows.
        let content_chars = result.content.chars().count();
        let next_chars = if assembled.is_empty() {
            content_chars
        } else {
            assembled_chars + 2 + content_chars
        };
        if next_chars > max_chars {
            break;
        }
        if !assembled.is_empty() {
            assembled.push_str("\n\n");
        }
        assembled.push_str(&result.content);
        assembled_chars = next_chars;
        cited.push(Citation {
            source_file: result.metadata.source_file.clone(),
            persona_ids: result.metadata.persona_ids.clone(),
        });
    }

    PersonaContext {
        assembled_context: assembled,
        cited_sources: cited,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocMetadata;
    use uuid::Uuid;

    fn result(name: &str, len: usize) -> SearchResult {
        SearchResult {
            id: Uuid::new_v5(&crate::models::CHUNK_ID_NAMESPACE, name.as_bytes()),
            content: "x".repeat(len),
            metadata: DocMetadata {
                source_file: format!("{}.txt", name),
                persona_ids: vec!["p".to_string()],
            },
            score: 1.0,
        }
    }

    #[test]
    fn test_budget_stops_before_overflowing_chunk() {
        // Two 800-char chunks fit in 1800 (800 + 2 + 800); a third would not.
        let results = vec![
            result("a", 800),
            result("b", 800),
            result("c", 800),
            result("d", 10),
            result("e", 10),
        ];
        let ctx = assemble_context(&results, 1800);
        assert_eq!(ctx.cited_sources.len(), 2);
        assert_eq!(ctx.assembled_context.len(), 800 + 2 + 800);
        // Assembly stops at the first overflow; the small later chunks are
        // not pulled forward out of rank order.
        assert!(!ctx
            .cited_sources
            .iter()
            .any(|c| c.source_file == "d.txt"));
    }

    #[test]
    fn test_first_chunk_over_budget_yields_empty() {
        let results = vec![result("big", 2000)];
        let ctx = assemble_context(&results, 1800);
        assert!(ctx.assembled_context.is_empty());
        assert!(ctx.cited_sources.is_empty());
    }

    #[test]
    fn test_all_chunks_fit() {
        let results = vec![result("a", 100), result("b", 100)];
        let ctx = assemble_context(&results, 1800);
        assert_eq!(ctx.cited_sources.len(), 2);
        assert_eq!(ctx.cited_sources[0].source_file, "a.txt");
        assert!(ctx.assembled_context.contains("\n\n"));
    }

    #[test]
    fn test_empty_input() {
        let ctx = assemble_context(&[], 1800);
        assert!(ctx.assembled_context.is_empty());
        assert!(ctx.cited_sources.is_empty());
    }

    #[test]
    fn test_budget_counts_chars_not_bytes() {
        // 1000 chars but 3000 bytes; a character budget of 1800 fits it.
        let mut multibyte = result("jp", 0);
        multibyte.content = "あ".repeat(1000);
        let ctx = assemble_context(&[multibyte], 1800);
        assert_eq!(ctx.cited_sources.len(), 1);
        assert_eq!(ctx.assembled_context.chars().count(), 1000);
    }

    #[test]
    fn test_exact_fit_is_included() {
        let results = vec![result("a", 100)];
        let ctx = assemble_context(&results, 100);
        assert_eq!(ctx.cited_sources.len(), 1);
    }
}
