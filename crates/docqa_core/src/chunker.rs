use serde::{Deserialize, Serialize};

use crate::document::{Document, DocumentType};
use crate::error::AppError;

/// Window geometry for the chunker. Sizes count Unicode scalar values, not
/// bytes, so multi-byte text windows the same way short ASCII does.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Trimmed candidates must be strictly longer than this to survive.
    pub min_chunk_len: usize,
}

impl ChunkerConfig {
    /// Validates window geometry up front: the stride
    /// `chunk_size - chunk_overlap` must be positive or the window never
    /// advances.
    pub fn new(
        chunk_size: usize,
        chunk_overlap: usize,
        min_chunk_len: usize,
    ) -> Result<Self, AppError> {
        if chunk_size == 0 {
            return Err(AppError::new(
                "CHUNKER_CONFIG_INVALID",
                "Chunk size must be positive",
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::new(
                "CHUNKER_CONFIG_INVALID",
                "Chunk overlap must be smaller than chunk size",
            )
            .with_details(format!(
                "chunk_size={chunk_size}; chunk_overlap={chunk_overlap}"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            min_chunk_len,
        })
    }

    fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

/// A bounded, overlapping slice of one document: the unit of retrieval.
/// `chunk_id` is assigned as a running counter across the whole batch, so ids
/// are unique and contiguous from zero within one indexing pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub source: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub page: Option<u32>,
    pub chunk_id: u32,
}

/// Provenance carried alongside every indexed entry and retrieval result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub source: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub page: Option<u32>,
    pub chunk_id: u32,
}

impl Chunk {
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            source: self.source.clone(),
            doc_type: self.doc_type,
            page: self.page,
            chunk_id: self.chunk_id,
        }
    }
}

/// Splits documents into overlapping fixed-size chunks.
///
/// Pure transform: a fixed-width window slides over each document's content
/// with stride `chunk_size - chunk_overlap`; each window is trimmed and
/// dropped when at or under `min_chunk_len` (trailing whitespace-only tail
/// windows index nothing useful). Splits may fall mid-word; there is no
/// sentence or paragraph awareness. Empty content yields zero chunks, not an
/// error.
pub fn chunk(config: &ChunkerConfig, documents: &[Document]) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();

    for doc in documents {
        let chars: Vec<char> = doc.content.chars().collect();
        let mut start = 0usize;
        while start < chars.len() {
            let end = (start + config.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            let trimmed = window.trim();
            if trimmed.chars().count() > config.min_chunk_len {
                chunks.push(Chunk {
                    content: trimmed.to_string(),
                    source: doc.source.clone(),
                    doc_type: doc.doc_type,
                    page: doc.page,
                    chunk_id: chunks.len() as u32,
                });
            }
            start += config.stride();
        }
    }

    chunks
}
