//! Character-window text splitter.
//!
//! Chunks hold at most `chunk_size` characters and each chunk starts exactly
//! `chunk_overlap` characters before the end of its predecessor. Within that
//! contract the end of a chunk is pulled back to the last paragraph break,
//! line break or space in the window when one exists past the midpoint.

use crate::config::ChunkingSettings;
use crate::error::{Error, Result};

const SEPARATORS: [&[char]; 3] = [&['\n', '\n'], &['\n'], &[' ']];

#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

/// A piece of text and the character offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub text: String,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split(&self, text: &str) -> Vec<TextSpan> {
        let chars: Vec<char> = text.chars().collect();
        if chars.iter().all(|c| c.is_whitespace()) {
            return Vec::new();
        }
        let mut spans = Vec::new();
        let mut start = 0usize;
        loop {
            if chars.len() - start <= self.chunk_size {
                spans.push(TextSpan { start, text: chars[start..].iter().collect() });
                break;
            }
            let end = self.find_end(&chars, start);
            spans.push(TextSpan { start, text: chars[start..end].iter().collect() });
            start = end - self.chunk_overlap;
        }
        spans
    }

    /// Pick the exclusive end of the chunk starting at `start`. Caller
    /// guarantees more than `chunk_size` characters remain.
    fn find_end(&self, chars: &[char], start: usize) -> usize {
        let hard_end = start + self.chunk_size;
        // Never shorter than the overlap, so every step makes progress.
        let min_end = start + (self.chunk_overlap + 1).max(self.chunk_size / 2);
        for sep in SEPARATORS {
            if let Some(end) = last_separator_end(chars, start, hard_end, sep) {
                if end >= min_end {
                    return end;
                }
            }
        }
        hard_end
    }
}

fn last_separator_end(chars: &[char], start: usize, end: usize, sep: &[char]) -> Option<usize> {
    if end - start < sep.len() {
        return None;
    }
    (start..=end - sep.len())
        .rev()
        .find(|&pos| &chars[pos..pos + sep.len()] == sep)
        .map(|pos| pos + sep.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_single_span() {
        let s = TextSplitter::new(300, 100).unwrap();
        let spans = s.split("Alice fell down the rabbit hole.");
        assert_eq!(
            spans,
            vec![TextSpan { start: 0, text: "Alice fell down the rabbit hole.".into() }]
        );
    }

    #[test]
    fn whitespace_only_text_has_no_spans() {
        let s = TextSplitter::new(300, 100).unwrap();
        assert!(s.split("  \n\n \t ").is_empty());
        assert!(s.split("").is_empty());
    }

    #[test]
    fn prefers_paragraph_break_for_chunk_end() {
        let s = TextSplitter::new(20, 5).unwrap();
        let text = "aaaaaaaaaaaaa\n\nbbbbbbbbbbbbbbbbbbbb";
        let spans = s.split(text);
        assert_eq!(spans[0].text, "aaaaaaaaaaaaa\n\n");
        assert_eq!(spans[1].start, 10);
    }

    #[test]
    fn hard_cut_without_separators() {
        let s = TextSplitter::new(10, 3).unwrap();
        let text = "x".repeat(25);
        let spans = s.split(&text);
        let starts: Vec<usize> = spans.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 7, 14, 21]);
        assert!(spans.iter().all(|s| s.text.chars().count() <= 10));
    }

    #[test]
    fn counts_characters_not_bytes() {
        let s = TextSplitter::new(4, 1).unwrap();
        let spans = s.split("ééééééé");
        assert_eq!(spans[0].text, "éééé");
        assert_eq!(spans[1].start, 3);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(TextSplitter::new(100, 100).is_err());
        assert!(TextSplitter::new(0, 0).is_err());
    }
}
