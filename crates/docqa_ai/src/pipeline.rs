use docqa_core::chunker;
use docqa_core::document::{Document, DocumentType};
use docqa_core::error::AppError;
use docqa_core::settings::Settings;
use docqa_core::state::SystemState;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

use crate::answer;
use crate::context;
use crate::embeddings::Embedder;
use crate::index::IndexStore;
use crate::llm::Generator;
use crate::retrieve::{relevance_score, retrieve};

/// Fixed answer for the no-grounding outcome. This is a normal, successful
/// result, distinct from any fault.
pub const NO_MATCH_ANSWER: &str = "No relevant documentation found for your question.";

/// One attribution record per retrieved chunk, in retrieval rank order.
/// `relevance_score` is `None` when no distance information existed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    pub source: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub page: Option<u32>,
    pub relevance_score: Option<f32>,
}

/// The entire external contract of the core: answer, attributions, and a
/// bounded context preview. UI layers only format this.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub context: String,
}

/// Owns the index handle and both collaborator capabilities for the process
/// lifetime: opened once at startup, single writer, no process-global state.
pub struct RagPipeline {
    settings: Settings,
    index: IndexStore,
    embedder: Box<dyn Embedder>,
    generator: Box<dyn Generator>,
}

fn now_rfc3339_utc() -> Result<String, AppError> {
    OffsetDateTime::now_utc().format(&Rfc3339).map_err(|e| {
        AppError::new("INDEX_BUILD_FAILED", "Failed to format build timestamp")
            .with_details(e.to_string())
    })
}

impl RagPipeline {
    pub fn new(
        settings: Settings,
        embedder: Box<dyn Embedder>,
        generator: Box<dyn Generator>,
    ) -> Self {
        let index = IndexStore::open(settings.data_dir.clone());
        Self {
            settings,
            index,
            embedder,
            generator,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The persisted build record, for freshness inspection.
    pub fn state(&self) -> Result<Option<SystemState>, AppError> {
        self.index.state()
    }

    /// Full rebuild of the index from a document batch: chunk, embed, commit.
    /// Any embedding or storage failure aborts with nothing committed.
    pub fn build_index(&self, documents: &[Document]) -> Result<SystemState, AppError> {
        let config = self.settings.chunker_config()?;
        let chunks = chunker::chunk(&config, documents);
        info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "chunked corpus for indexing"
        );

        let indexed_at = now_rfc3339_utc()?;
        self.index.rebuild(
            &chunks,
            self.embedder.as_ref(),
            &self.settings.embedding_model,
            Some(&self.settings.generative_model),
            &indexed_at,
        )
    }

    /// Retrieval-augmented answer for one question. Two terminal outcomes:
    /// no grounding (fixed answer, empty sources and context) or an answered
    /// response with one source per retrieved chunk in rank order. The index
    /// is never mutated and no state is kept between calls.
    pub fn query(&self, question: &str) -> Result<QueryResponse, AppError> {
        let results = retrieve(
            &self.index,
            self.embedder.as_ref(),
            &self.settings.embedding_model,
            question,
            self.settings.top_k,
        )?;

        if results.is_empty() {
            return Ok(QueryResponse {
                answer: NO_MATCH_ANSWER.to_string(),
                sources: Vec::new(),
                context: String::new(),
            });
        }

        let assembled = context::assemble(&results);
        let answer = answer::answer(
            self.generator.as_ref(),
            &self.settings.generative_model,
            &self.settings.domain_label,
            question,
            &assembled.full,
        );

        let sources = results
            .iter()
            .map(|r| SourceRef {
                source: r.metadata.source.clone(),
                doc_type: r.metadata.doc_type,
                page: r.metadata.page,
                relevance_score: relevance_score(r.distance),
            })
            .collect();

        Ok(QueryResponse {
            answer,
            sources,
            context: assembled.preview,
        })
    }
}
