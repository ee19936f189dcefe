//! Sliding-window text chunker.
//!
//! Splits extracted document text into fixed-size character windows that
//! overlap by a configurable amount, so context at a chunk boundary appears
//! in both neighbouring chunks. The split is a pure function of the input
//! text and configuration: re-running on identical input yields identical
//! chunks in identical order.

/// Split `text` into overlapping windows of `chunk_size` characters,
/// advancing by `chunk_size - chunk_overlap` per step. Empty text produces
/// no chunks; the final chunk may be shorter than `chunk_size`.
///
/// `chunk_overlap` must be strictly less than `chunk_size` (enforced at
/// config load); the step is clamped to at least 1 so the walk always
/// terminates.
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    // Window over chars, not bytes, so multi-byte input never splits
    // mid-character.
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(chunk_text("", 500, 50).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", 500, 50);
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn test_window_offsets_and_final_length() {
        // 1200 chars at 500/50 => offsets 0, 450, 900; last chunk 300 chars.
        let text: String = std::iter::repeat('x').take(1200).collect();
        let chunks = chunk_text(&text, 500, 50);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 500);
        assert_eq!(chunks[1].chars().count(), 500);
        assert_eq!(chunks[2].chars().count(), 300);
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let text: String = ('a'..='z').cycle().take(1000).collect();
        let chunks = chunk_text(&text, 500, 50);
        let tail: String = chunks[0].chars().skip(450).collect();
        let head: String = chunks[1].chars().take(50).collect();
        assert_eq!(tail, head);
    }

    #[test]
    fn test_deterministic() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let a = chunk_text(&text, 500, 50);
        let b = chunk_text(&text, 500, 50);
        assert_eq!(a, b);
    }

    #[test]
    fn test_exact_multiple_of_step() {
        // 900 chars: offsets 0, 450 => two chunks, second 450 chars.
        let text: String = std::iter::repeat('y').take(900).collect();
        let chunks = chunk_text(&text, 500, 50);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].chars().count(), 450);
    }

    #[test]
    fn test_multibyte_input_never_panics() {
        let text = "日本語のテキスト。".repeat(200);
        let chunks = chunk_text(&text, 500, 50);
        assert!(!chunks.is_empty());
        let total: usize = text.chars().count();
        assert_eq!(chunks[0].chars().count(), 500.min(total));
    }

    #[test]
    fn test_zero_overlap_partitions_text() {
        let text: String = std::iter::repeat('z').take(1000).collect();
        let chunks = chunk_text(&text, 250, 0);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks.concat(), text);
    }
}
