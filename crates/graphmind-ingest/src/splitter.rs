use std::collections::VecDeque;

use tracing::warn;

use graphmind_core::types::{Chunk, SourceDocument};

/// Recursive character text splitter.
///
/// Splits on the first separator present in the text (`"\n\n"`, `"\n"`,
/// `" "`, then per-character), recursing into oversized pieces with the
/// remaining separators, and merges small pieces into chunks that respect
/// `chunk_size` with `chunk_overlap` carry-over. Lengths are in characters.
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.max(1) - 1),
            separators: vec!["\n\n".into(), "\n".into(), " ".into(), String::new()],
        }
    }

    /// Split a text into chunks. Non-blank input always yields at least one chunk.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        let mut chunks = self.split_recursive(text, &separators);
        chunks.retain(|c| !c.is_empty());

        if chunks.is_empty() && !text.trim().is_empty() {
            chunks.push(text.trim().to_string());
        }
        chunks
    }

    /// Split documents into chunks, tagging each chunk with its parent's
    /// metadata plus a `chunk_index`.
    pub fn split_documents(&self, documents: &[SourceDocument]) -> Vec<Chunk> {
        if documents.is_empty() {
            warn!("No documents provided for chunking");
            return Vec::new();
        }

        let mut chunks = Vec::new();
        for doc in documents {
            for (i, text) in self.split_text(&doc.text).into_iter().enumerate() {
                let mut metadata = doc.metadata.clone();
                metadata.insert("chunk_index".into(), serde_json::json!(i));
                chunks.push(Chunk { text, metadata });
            }
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // Pick the first separator present in the text; "" always matches.
        let mut separator = "";
        let mut remaining: &[&str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() || text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let pieces: Vec<String> = if separator.is_empty() {
            text.chars().map(|c| c.to_string()).collect()
        } else {
            text.split(separator).map(str::to_string).collect()
        };

        let mut finals = Vec::new();
        let mut small: Vec<String> = Vec::new();

        for piece in pieces {
            if char_len(&piece) < self.chunk_size {
                small.push(piece);
            } else {
                if !small.is_empty() {
                    finals.extend(self.merge_splits(&small, separator));
                    small.clear();
                }
                if remaining.is_empty() {
                    finals.push(piece);
                } else {
                    finals.extend(self.split_recursive(&piece, remaining));
                }
            }
        }

        if !small.is_empty() {
            finals.extend(self.merge_splits(&small, separator));
        }
        finals
    }

    /// Merge small splits into chunks up to `chunk_size`, carrying the last
    /// `chunk_overlap` characters' worth of splits into the next chunk.
    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&String> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let len = char_len(split);
            let sep_cost = if current.is_empty() { 0 } else { sep_len };

            if total + len + sep_cost > self.chunk_size && !current.is_empty() {
                if let Some(doc) = join_splits(&current, separator) {
                    docs.push(doc);
                }
                // Shrink the window until the next split fits within the overlap
                while total > self.chunk_overlap
                    || (!current.is_empty()
                        && total + len + if current.is_empty() { 0 } else { sep_len }
                            > self.chunk_size)
                {
                    let Some(front) = current.front() else {
                        break;
                    };
                    let drop = char_len(front) + if current.len() > 1 { sep_len } else { 0 };
                    total = total.saturating_sub(drop);
                    current.pop_front();
                }
            }

            total += len + if current.is_empty() { 0 } else { sep_len };
            current.push_back(split);
        }

        if let Some(doc) = join_splits(&current, separator) {
            docs.push(doc);
        }
        docs
    }
}

fn join_splits(parts: &VecDeque<&String>, separator: &str) -> Option<String> {
    let joined = parts
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = RecursiveCharacterSplitter::new(100, 20);
        let chunks = splitter.split_text("a short paragraph");
        assert_eq!(chunks, vec!["a short paragraph"]);
    }

    #[test]
    fn test_long_text_respects_chunk_size() {
        let splitter = RecursiveCharacterSplitter::new(20, 5);
        let text = "one two three four five six seven eight nine ten";
        let chunks = splitter.split_text(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20, "oversized chunk: {:?}", chunk);
        }
    }

    #[test]
    fn test_paragraph_boundaries_preferred() {
        let splitter = RecursiveCharacterSplitter::new(30, 0);
        let chunks = splitter.split_text("first paragraph here\n\nsecond paragraph here");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "first paragraph here");
        assert_eq!(chunks[1], "second paragraph here");
    }

    #[test]
    fn test_overlap_carries_content() {
        let splitter = RecursiveCharacterSplitter::new(15, 8);
        let chunks = splitter.split_text("aaa bbb ccc ddd eee fff");
        assert!(chunks.len() > 1);
        // Consecutive chunks share some text via the overlap window
        let shared = chunks[0]
            .split_whitespace()
            .any(|w| chunks[1].contains(w));
        assert!(shared);
    }

    #[test]
    fn test_unbreakable_run_splits_by_char() {
        let splitter = RecursiveCharacterSplitter::new(10, 0);
        let chunks = splitter.split_text(&"x".repeat(35));
        assert!(chunks.len() >= 4);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
    }

    #[test]
    fn test_split_documents_stamps_chunk_index() {
        let splitter = RecursiveCharacterSplitter::new(10, 0);
        let mut doc = SourceDocument::new("alpha beta gamma delta");
        doc.metadata
            .insert("file_name".into(), serde_json::json!("doc.txt"));

        let chunks = splitter.split_documents(std::slice::from_ref(&doc));
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].metadata["chunk_index"], 0);
        assert_eq!(chunks[1].metadata["chunk_index"], 1);
        // Parent metadata inherited
        assert_eq!(chunks[0].metadata["file_name"], "doc.txt");
    }

    #[test]
    fn test_splitting_never_reduces_count() {
        let splitter = RecursiveCharacterSplitter::new(500, 200);
        let docs = vec![
            SourceDocument::new("document one content"),
            SourceDocument::new("document two content"),
        ];
        let chunks = splitter.split_documents(&docs);
        assert!(chunks.len() >= docs.len());
    }

    #[test]
    fn test_empty_input() {
        let splitter = RecursiveCharacterSplitter::new(100, 10);
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_documents(&[]).is_empty());
    }
}
