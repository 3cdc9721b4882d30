//! Recursive chunking strategy

use unicode_segmentation::UnicodeSegmentation;

use crate::domain::ingestion::chunker::helpers::overlap_tail;
use crate::domain::ingestion::{Chunk, ChunkingConfig, ChunkingStrategy};
use crate::domain::DomainError;

/// Chunking strategy that recursively splits text hierarchically
///
/// Splitting order: headers -> paragraphs -> sentences -> words. Every chunk
/// after the first is prefixed with up to `chunk_overlap` bytes from the end
/// of its predecessor, cut at a word boundary.
#[derive(Debug, Clone, Default)]
pub struct RecursiveChunker;

impl RecursiveChunker {
    /// Create a new recursive chunker
    pub fn new() -> Self {
        Self
    }

    fn split_by_headers(text: &str) -> Vec<&str> {
        let mut parts = Vec::new();
        let mut current_start = 0;

        for (i, line) in text.lines().enumerate() {
            if line.starts_with('#') && i > 0 {
                let pos = text[current_start..]
                    .find(line)
                    .map(|p| current_start + p)
                    .unwrap_or(current_start);

                if pos > current_start {
                    let part = &text[current_start..pos];

                    if !part.trim().is_empty() {
                        parts.push(part.trim());
                    }
                }
                current_start = pos;
            }
        }

        if current_start < text.len() {
            let part = &text[current_start..];

            if !part.trim().is_empty() {
                parts.push(part.trim());
            }
        }

        parts
    }

    fn split_by_paragraphs(text: &str) -> Vec<&str> {
        text.split("\n\n")
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect()
    }

    fn split_by_sentences(text: &str) -> Vec<&str> {
        text.unicode_sentences()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn recursive_chunk(text: &str, chunk_size: usize, level: usize) -> Vec<String> {
        if text.len() <= chunk_size {
            return vec![text.to_string()];
        }

        let parts = match level {
            0 => Self::split_by_headers(text),
            1 => Self::split_by_paragraphs(text),
            2 => Self::split_by_sentences(text),
            _ => return Self::split_by_words(text, chunk_size),
        };

        if parts.len() <= 1 {
            return Self::recursive_chunk(text, chunk_size, level + 1);
        }

        let separator = if level < 2 { "\n\n" } else { " " };
        let mut result = Vec::new();
        let mut current = String::new();

        for part in parts {
            if current.is_empty() {
                current = part.to_string();
            } else if current.len() + separator.len() + part.len() <= chunk_size {
                current.push_str(separator);
                current.push_str(part);
            } else {
                Self::flush(&mut result, std::mem::take(&mut current), chunk_size, level);
                current = part.to_string();
            }
        }

        if !current.is_empty() {
            Self::flush(&mut result, current, chunk_size, level);
        }

        result
    }

    fn flush(result: &mut Vec<String>, piece: String, chunk_size: usize, level: usize) {
        if piece.len() > chunk_size {
            result.extend(Self::recursive_chunk(&piece, chunk_size, level + 1));
        } else {
            result.push(piece);
        }
    }

    /// Last resort; a single word longer than `chunk_size` stays whole
    fn split_by_words(text: &str, chunk_size: usize) -> Vec<String> {
        let mut result = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            if current.is_empty() {
                current = word.to_string();
            } else if current.len() + 1 + word.len() <= chunk_size {
                current.push(' ');
                current.push_str(word);
            } else {
                result.push(std::mem::replace(&mut current, word.to_string()));
            }
        }

        if !current.is_empty() {
            result.push(current);
        }

        result
    }

    fn with_overlap(pieces: Vec<String>, overlap: usize) -> Vec<String> {
        if overlap == 0 {
            return pieces;
        }

        let mut result = Vec::with_capacity(pieces.len());
        let mut previous: Option<String> = None;

        for piece in pieces {
            let text = match previous.as_deref().map(|p| overlap_tail(p, overlap)) {
                Some(tail) if !tail.is_empty() => format!("{} {}", tail, piece),
                _ => piece.clone(),
            };
            result.push(text);
            previous = Some(piece);
        }

        result
    }
}

impl ChunkingStrategy for RecursiveChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError> {
        config.validate()?;

        let content = content.trim();

        if content.is_empty() {
            return Ok(vec![]);
        }

        if content.len() <= config.chunk_size {
            return Ok(vec![Chunk::new(content, 0)]);
        }

        let pieces: Vec<String> = Self::recursive_chunk(content, config.chunk_size, 0)
            .into_iter()
            .filter(|piece| piece.len() >= config.min_chunk_size)
            .collect();

        if pieces.is_empty() {
            return Ok(vec![Chunk::new(content, 0)]);
        }

        Ok(Self::with_overlap(pieces, config.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk::new(text, index))
            .collect())
    }

    fn name(&self) -> &'static str {
        "recursive"
    }
}
