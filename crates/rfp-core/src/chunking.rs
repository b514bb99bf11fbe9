//! Text chunking at semantic boundaries with configurable overlap (L6).
//!
//! Token counts are estimated as `ceil(len / 4)` rather than run through a
//! real tokenizer; the extractors downstream only need chunks that stay
//! comfortably under the model's context window, not exact counts.

use once_cell::sync::Lazy;
use regex::Regex;

/// A single chunk of text, carrying its offsets into the original string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub start_char: usize,
    pub end_char: usize,
    pub chunk_index: usize,
}

static BOUNDARY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)(\n\s*\n)|(^#{1,6}\s)|(^\s*\d+[.)]\s)|(^[-*_]{3,}\s*$)|(Section \d+)|(^[A-Z][A-Z \t]{5,}$)",
    )
    .expect("boundary pattern is a valid regex")
});

fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Offsets, in ascending order, of every semantic boundary in `text`, plus
/// the implicit anchors at `0` and `text.len()`.
fn boundary_offsets(text: &str) -> Vec<usize> {
    let mut offsets: Vec<usize> = BOUNDARY_PATTERN.find_iter(text).map(|m| m.start()).collect();
    offsets.push(0);
    offsets.push(text.len());
    offsets.sort_unstable();
    offsets.dedup();
    offsets
}

/// Split `text` into chunks of at most `max_tokens` estimated tokens, with
/// `overlap_tokens` of overlap between adjacent chunks, cutting at the
/// latest semantic boundary within the back half of the target window when
/// one is available.
pub fn chunk_text(text: &str, max_tokens: usize, overlap_tokens: usize) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }

    if estimate_tokens(text) <= max_tokens {
        return vec![Chunk {
            text: text.to_string(),
            start_char: 0,
            end_char: text.len(),
            chunk_index: 0,
        }];
    }

    let max_chars = max_tokens * 4;
    let overlap_chars = overlap_tokens * 4;
    let boundaries = boundary_offsets(text);
    let len = text.len();

    let mut chunks = Vec::new();
    let mut cursor = 0usize;
    let mut chunk_index = 0usize;

    while cursor < len {
        let target = (cursor + max_chars).min(len);
        let half = cursor + max_chars / 2;

        let end = if target < len {
            boundaries
                .iter()
                .copied()
                .filter(|&b| b > half.min(target) && b <= target && b > cursor)
                .next_back()
                .unwrap_or(target)
        } else {
            target
        };

        let end = char_boundary_at_or_before(text, end.max(cursor + 1).min(len));
        let raw = &text[cursor..end];
        let trimmed_start = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();

        if !trimmed.is_empty() {
            chunks.push(Chunk {
                text: trimmed.to_string(),
                start_char: cursor + trimmed_start,
                end_char: cursor + trimmed_start + trimmed.len(),
                chunk_index,
            });
            chunk_index += 1;
        }

        if end >= len {
            break;
        }

        let next_cursor = end.saturating_sub(overlap_chars);
        cursor = if next_cursor <= cursor { end } else { char_boundary_at_or_before(text, next_cursor) };
    }

    chunks
}

fn char_boundary_at_or_before(text: &str, mut offset: usize) -> usize {
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_returns_single_chunk() {
        let text = "A short requirements summary.";
        let chunks = chunk_text(text, 4000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_char, 0);
        assert_eq!(chunks[0].end_char, text.len());
    }

    #[test]
    fn long_text_splits_into_multiple_chunks() {
        let section = "word ".repeat(500);
        let text = format!("{section}\n\nSection 2\n\n{section}\n\nSection 3\n\n{section}");
        let chunks = chunk_text(&text, 100, 10);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(!chunk.text.is_empty());
        }
    }

    #[test]
    fn chunks_cover_full_text_with_overlap_permitted() {
        let section = "Line of requirement text here. ".repeat(200);
        let text = format!("# Heading one\n\n{section}\n\n# Heading two\n\n{section}");
        let chunks = chunk_text(&text, 50, 5);

        assert!(chunks.last().unwrap().end_char >= text.len() - 1);
        for window in chunks.windows(2) {
            assert!(window[1].start_char <= window[0].end_char);
        }
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 4000, 200).is_empty());
    }

    #[test]
    fn chunk_indices_are_sequential() {
        let section = "word ".repeat(500);
        let chunks = chunk_text(&section, 100, 10);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
    }
}
