//! Overlapping token-window chunking

use serde::Serialize;

use crate::domain::DomainError;

/// One window of source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    /// Token offsets `[start, end)` within the source
    pub start_token: usize,
    pub end_token: usize,
}

/// Split `text` into windows of `window` whitespace tokens, consecutive
/// windows sharing `overlap` tokens. The last window may be shorter.
pub fn chunk_tokens(text: &str, window: usize, overlap: usize) -> Result<Vec<TextChunk>, DomainError> {
    if window == 0 {
        return Err(DomainError::validation("chunk window must be positive"));
    }

    if overlap >= window {
        return Err(DomainError::validation(
            "chunk overlap must be smaller than the chunk window",
        ));
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(vec![]);
    }

    let step = window - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + window).min(tokens.len());
        chunks.push(TextChunk {
            index: chunks.len(),
            text: tokens[start..end].join(" "),
            start_token: start,
            end_token: end,
        });

        if end == tokens.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_tokens("a  short\ntext", 500, 50).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "a short text");
    }

    #[test]
    fn test_windows_overlap() {
        let chunks = chunk_tokens(&words(10), 4, 1).unwrap();

        let ranges: Vec<_> = chunks.iter().map(|c| (c.start_token, c.end_token)).collect();
        assert_eq!(ranges, vec![(0, 4), (3, 7), (6, 10)]);
        assert!(chunks[1].text.starts_with("w3 "));
        assert_eq!(chunks[2].index, 2);
    }

    #[test]
    fn test_default_window_sizes() {
        let chunks = chunk_tokens(&words(1000), 500, 50).unwrap();
        let ranges: Vec<_> = chunks.iter().map(|c| (c.start_token, c.end_token)).collect();
        assert_eq!(ranges, vec![(0, 500), (450, 950), (900, 1000)]);
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_tokens("   ", 10, 2).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_overlap() {
        assert!(chunk_tokens("a b c", 2, 2).is_err());
        assert!(chunk_tokens("a b c", 0, 0).is_err());
    }
}
