//! Greedy character-budget chunking with a sliding overlap.
//!
//! Each chunk consumes up to `max_chunk_size` characters of the input, then
//! the next chunk starts `overlap` characters before the previous cut so no
//! information is lost at boundaries. Cuts prefer the whitespace boundary
//! nearest the budget so words are kept whole, and all indexing is done in
//! characters so multi-byte text is never split mid-character. For text with
//! no usable boundaries the chunk count is exactly
//! `ceil((len - overlap) / (max_chunk_size - overlap))`.

use super::types::ChunkingError;

/// A bounded fragment of the extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk relative to the other chunks of the document.
    pub index: usize,
    /// Chunk text; never empty, never longer than the configured budget.
    pub text: String,
}

/// Split `text` into overlapping chunks covering the entire input.
///
/// Returns an empty vector for all-whitespace input; the orchestrator treats
/// that as an upstream extraction failure, not a chunking failure.
pub fn chunk_text(
    text: &str,
    max_chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>, ChunkingError> {
    if max_chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= max_chunk_size {
        return Err(ChunkingError::InvalidOverlap {
            overlap,
            max_chunk_size,
        });
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    // Byte offset of every character plus a sentinel for the end of input,
    // so slicing below always lands on character boundaries.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let hard_end = (start + max_chunk_size).min(total);
        let end = if hard_end < total {
            snap_to_whitespace(&chars, start, hard_end, overlap)
        } else {
            hard_end
        };
        chunks.push(Chunk {
            index: chunks.len(),
            text: text[offsets[start]..offsets[end]].to_string(),
        });
        if end >= total {
            break;
        }
        start = end - overlap;
    }

    Ok(chunks)
}

/// Move the cut to the whitespace boundary nearest the budget.
///
/// The cut must stay more than `overlap` characters past `start` so the next
/// chunk makes forward progress; when the window holds no such boundary the
/// hard cut stands and a word is split.
fn snap_to_whitespace(chars: &[char], start: usize, hard_end: usize, overlap: usize) -> usize {
    if chars[hard_end].is_whitespace() || chars[hard_end - 1].is_whitespace() {
        return hard_end;
    }
    let min_cut = start + overlap + 1;
    let mut cut = hard_end;
    while cut > min_cut {
        if chars[cut - 1].is_whitespace() {
            return cut;
        }
        cut -= 1;
    }
    hard_end
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drop the duplicated overlap prefix of every chunk after the first and
    /// glue the remainders back together.
    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        let mut text = String::new();
        for (position, chunk) in chunks.iter().enumerate() {
            if position == 0 {
                text.push_str(&chunk.text);
            } else {
                text.extend(chunk.text.chars().skip(overlap));
            }
        }
        text
    }

    #[test]
    fn short_input_yields_one_chunk() {
        let chunks = chunk_text("tiny", 16, 4).expect("chunking succeeds");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "tiny");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn empty_input_yields_zero_chunks() {
        assert!(chunk_text("", 16, 4).expect("chunking succeeds").is_empty());
        assert!(
            chunk_text("   \n\t", 16, 4)
                .expect("chunking succeeds")
                .is_empty()
        );
    }

    #[test]
    fn boundary_free_text_matches_count_formula() {
        let text = "a".repeat(100);
        let (size, overlap) = (10, 3);
        let chunks = chunk_text(&text, size, overlap).expect("chunking succeeds");
        // ceil((100 - 3) / (10 - 3)) = ceil(97 / 7) = 14
        assert_eq!(chunks.len(), 14);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= size);
            assert!(!chunk.text.is_empty());
        }
        assert_eq!(reconstruct(&chunks, overlap), text);
    }

    #[test]
    fn reconstruction_is_lossless_for_prose() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(8);
        let overlap = 5;
        let chunks = chunk_text(&text, 24, overlap).expect("chunking succeeds");
        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks, overlap), text);
    }

    #[test]
    fn cuts_land_on_word_boundaries_when_available() {
        let text = "the quick brown fox jumps over the lazy dog ".repeat(4);
        let overlap = 4;
        let chunks = chunk_text(&text, 16, overlap).expect("chunking succeeds");
        for pair in chunks.windows(2) {
            let current = &pair[0];
            let next = &pair[1];
            // The character right before or right after the cut is whitespace,
            // i.e. no word was severed. The cut character itself is the
            // character at position `overlap` of the following chunk.
            let ends_on_boundary = current.text.ends_with(|c: char| c.is_whitespace());
            let next_after_cut = next
                .text
                .chars()
                .nth(overlap)
                .is_some_and(char::is_whitespace);
            assert!(
                ends_on_boundary || next_after_cut,
                "cut split a word: {:?} -> {:?}",
                current.text,
                next.text
            );
        }
        assert_eq!(reconstruct(&chunks, overlap), text);
    }

    #[test]
    fn multibyte_text_never_splits_a_character() {
        let text = "héllö wörld ünd ähnliches zeug ".repeat(6);
        let overlap = 3;
        let chunks = chunk_text(&text, 12, overlap).expect("chunking succeeds");
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 12);
        }
        assert_eq!(reconstruct(&chunks, overlap), text);
    }

    #[test]
    fn indexes_are_sequential() {
        let text = "b".repeat(50);
        let chunks = chunk_text(&text, 10, 2).expect("chunking succeeds");
        for (expected, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, expected);
        }
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let error = chunk_text("hello", 0, 0).unwrap_err();
        assert!(matches!(error, ChunkingError::InvalidChunkSize));
    }

    #[test]
    fn rejects_overlap_at_or_above_chunk_size() {
        let error = chunk_text("hello", 8, 8).unwrap_err();
        assert!(matches!(error, ChunkingError::InvalidOverlap { .. }));
        let error = chunk_text("hello", 8, 12).unwrap_err();
        assert!(matches!(error, ChunkingError::InvalidOverlap { .. }));
    }
}
