use std::fs;
use std::path::{Path, PathBuf};

use docqa_core::chunker::{Chunk, ChunkMetadata};
use docqa_core::error::AppError;
use docqa_core::state::{self, SystemState, SYSTEM_STATE_FILE};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::embeddings::Embedder;

mod similarity;

use similarity::l2_norm;

/// One persisted member of the index collection: chunk text, its embedding,
/// and provenance. `text_sha256` lets inspection tooling detect index/corpus
/// drift without re-embedding anything.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedEntry {
    pub id: String,
    pub embedding: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub text_sha256: String,
}

/// Durable embedding index at a fixed on-disk location.
///
/// The collection lives at `<root>/index/entries.json` and is replaced
/// wholesale by every rebuild; the adjacent state file records what build
/// produced it. One process owns the location for its lifetime (single-writer
/// assumption, documented rather than enforced).
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

impl IndexStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn index_dir(&self) -> PathBuf {
        self.root.join("index")
    }

    fn entries_path(&self) -> PathBuf {
        self.index_dir().join("entries.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.index_dir().join(SYSTEM_STATE_FILE)
    }

    fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(self.index_dir()).map_err(|e| {
            AppError::new("INDEX_STORE_FAILED", "Failed to create index directory")
                .with_details(format!("path={}; err={}", self.index_dir().display(), e))
        })
    }

    /// The persisted build record, `None` when no build has completed here.
    pub fn state(&self) -> Result<Option<SystemState>, AppError> {
        state::load(&self.state_path())
    }

    /// Reads the whole collection. An absent file is an empty collection.
    pub fn load_entries(&self) -> Result<Vec<IndexedEntry>, AppError> {
        let path = self.entries_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&path).map_err(|e| {
            AppError::new("INDEX_STORE_FAILED", "Failed to read index entries")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::new("INDEX_STORE_FAILED", "Failed to decode index entries")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    fn write_entries(&self, entries: &[IndexedEntry]) -> Result<(), AppError> {
        self.ensure_dirs()?;
        let path = self.entries_path();
        let tmp = path.with_extension("tmp");
        let json = serde_json::to_string_pretty(entries).map_err(|e| {
            AppError::new("INDEX_STORE_FAILED", "Failed to encode index entries")
                .with_details(e.to_string())
        })?;
        fs::write(&tmp, json.as_bytes()).map_err(|e| {
            AppError::new("INDEX_STORE_FAILED", "Failed to write index entries")
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).map_err(|e| {
            AppError::new("INDEX_STORE_FAILED", "Failed to finalize index entries write")
                .with_details(format!(
                    "tmp={}; dest={}; err={}",
                    tmp.display(),
                    path.display(),
                    e
                ))
        })?;
        Ok(())
    }

    /// Full rebuild: embeds every chunk as one order-preserving batch, then
    /// commits the new collection and state atomically from the caller's
    /// perspective. Nothing is written until every embedding succeeded, so a
    /// collaborator failure leaves the previous collection intact and the
    /// caller retries the whole build. Zero chunks commit an empty collection
    /// (an empty corpus is queryable, it just never matches).
    pub fn rebuild(
        &self,
        chunks: &[Chunk],
        embedder: &dyn Embedder,
        embedding_model: &str,
        generative_model: Option<&str>,
        indexed_at: &str,
    ) -> Result<SystemState, AppError> {
        self.ensure_dirs()?;

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            embedder.embed(embedding_model, &texts)?
        };

        if embeddings.len() != chunks.len() {
            return Err(AppError::new(
                "INDEX_BUILD_FAILED",
                "Embedding collaborator broke the order-preserving batch contract",
            )
            .with_details(format!(
                "chunks={}; embeddings={}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut dims: Option<usize> = None;
        let mut entries: Vec<IndexedEntry> = Vec::with_capacity(chunks.len());
        for (chunk, embedding) in chunks.iter().zip(embeddings.into_iter()) {
            match dims {
                Some(d) if d != embedding.len() => {
                    return Err(AppError::new(
                        "INDEX_BUILD_FAILED",
                        "Embedding dimension mismatch across chunks",
                    )
                    .with_details(format!(
                        "expected={d}; got={}; chunk_id={}",
                        embedding.len(),
                        chunk.chunk_id
                    )));
                }
                Some(_) => {}
                None => dims = Some(embedding.len()),
            }
            let digest = Sha256::digest(chunk.content.as_bytes());
            entries.push(IndexedEntry {
                id: format!("chunk-{}", chunk.chunk_id),
                embedding,
                text: chunk.content.clone(),
                metadata: chunk.metadata(),
                text_sha256: hex::encode(digest),
            });
        }

        self.write_entries(&entries)?;

        let new_state = SystemState {
            chunk_count: entries.len() as u32,
            embedding_model: embedding_model.to_string(),
            generative_model: generative_model.map(|s| s.to_string()),
            indexed_at: indexed_at.to_string(),
        };
        state::save(&self.state_path(), &new_state)?;

        info!(
            entries = entries.len(),
            model = embedding_model,
            "index rebuild committed"
        );
        Ok(new_state)
    }

    /// Up to `k` nearest entries by cosine distance, ascending (closest
    /// first); ties keep insertion order. An empty collection returns an
    /// empty vec, never an error.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<(IndexedEntry, f32)>, AppError> {
        let entries = self.load_entries()?;
        if entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let dims = entries[0].embedding.len();
        if vector.len() != dims {
            return Err(AppError::new(
                "RETRIEVAL_FAILED",
                "Query vector dims do not match index dims",
            )
            .with_details(format!("index_dims={dims}; query_dims={}", vector.len())));
        }
        let qnorm = l2_norm(vector);
        if qnorm == 0.0 {
            return Err(AppError::new(
                "RETRIEVAL_FAILED",
                "Query embedding norm is zero",
            ));
        }

        let mut scored: Vec<(IndexedEntry, f32)> = Vec::new();
        for entry in entries {
            if entry.embedding.len() != dims {
                return Err(AppError::new(
                    "RETRIEVAL_FAILED",
                    "Index entry dims mismatch",
                )
                .with_details(format!(
                    "id={}; expected={dims}; got={}",
                    entry.id,
                    entry.embedding.len()
                )));
            }
            let enorm = l2_norm(&entry.embedding);
            if enorm == 0.0 {
                debug!(id = %entry.id, "skipping zero-norm index entry");
                continue;
            }
            let distance = similarity::cosine_distance(vector, &entry.embedding, qnorm, enorm);
            scored.push((entry, distance));
        }

        // Stable sort: equal distances keep insertion (chunk_id) order.
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}
