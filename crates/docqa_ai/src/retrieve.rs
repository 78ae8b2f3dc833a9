use docqa_core::chunker::ChunkMetadata;
use docqa_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embeddings::Embedder;
use crate::index::IndexStore;

/// One ranked candidate for a query. Ephemeral; produced per query and never
/// persisted. `distance` is the raw cosine distance when the index reported
/// one; `None` means the backend gave no distance information at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub distance: Option<f32>,
}

/// Maps a raw cosine distance ([0, 2]) onto a bounded relevance score in
/// [0, 1], higher meaning more relevant. `None` stays `None`: unknown
/// confidence is an explicit sentinel, never a fabricated perfect score.
pub fn relevance_score(distance: Option<f32>) -> Option<f32> {
    distance.map(|d| (1.0 - d).clamp(0.0, 1.0))
}

/// Embeds the query through the same collaborator used at index time and
/// returns up to `k` chunks by ascending distance. Distances are only
/// comparable when query and index embeddings come from one model, so a
/// persisted state naming a different model is refused outright. An empty or
/// unmatched index yields an empty vec: "no grounding available" is a normal
/// outcome, not an error.
pub fn retrieve(
    index: &IndexStore,
    embedder: &dyn Embedder,
    embedding_model: &str,
    query: &str,
    k: usize,
) -> Result<Vec<RetrievalResult>, AppError> {
    let q = query.trim();
    if q.is_empty() {
        return Err(AppError::new(
            "RETRIEVAL_FAILED",
            "Query must not be empty",
        ));
    }

    if let Some(st) = index.state()? {
        if st.embedding_model != embedding_model {
            return Err(AppError::new(
                "INDEX_MODEL_MISMATCH",
                "Index was built with a different embedding model",
            )
            .with_details(format!(
                "index_model={}; configured_model={embedding_model}",
                st.embedding_model
            )));
        }
    }

    let mut vectors = embedder.embed(embedding_model, &[q])?;
    if vectors.len() != 1 {
        return Err(AppError::new(
            "EMBEDDINGS_FAILED",
            "Embedding collaborator returned a wrong-sized batch for the query",
        )
        .with_details(format!("expected=1; got={}", vectors.len())));
    }
    let qv = vectors.remove(0);

    let hits = index.query(&qv, k)?;
    debug!(query_len = q.len(), hits = hits.len(), "retrieval complete");

    Ok(hits
        .into_iter()
        .map(|(entry, distance)| RetrievalResult {
            content: entry.text,
            metadata: entry.metadata,
            distance: Some(distance),
        })
        .collect())
}
