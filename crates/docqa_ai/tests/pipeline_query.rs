use std::path::Path;

use docqa_core::document::{Document, DocumentType};
use docqa_core::error::AppError;
use docqa_core::settings::Settings;
use docqa_ai::embeddings::Embedder;
use docqa_ai::llm::Generator;
use docqa_ai::pipeline::{RagPipeline, NO_MATCH_ANSWER};
use pretty_assertions::assert_eq;

struct ByteStatsEmbedder;

impl Embedder for ByteStatsEmbedder {
    fn embed(&self, _model: &str, texts: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        Ok(texts
            .iter()
            .map(|t| {
                let bytes = t.as_bytes();
                let first = bytes.first().copied().unwrap_or(0) as f32;
                let last = bytes.last().copied().unwrap_or(0) as f32;
                vec![bytes.len() as f32, first, last]
            })
            .collect())
    }
}

struct CannedGenerator;

impl Generator for CannedGenerator {
    fn generate(&self, _model: &str, prompt: &str, _max_tokens: u32) -> Result<String, AppError> {
        assert!(prompt.starts_with("Context about "));
        assert!(prompt.ends_with("\n\nAnswer:"));
        Ok("Grounded answer derived from the retrieved context.".to_string())
    }
}

struct BrokenGenerator;

impl Generator for BrokenGenerator {
    fn generate(&self, _model: &str, _prompt: &str, _max_tokens: u32) -> Result<String, AppError> {
        Err(AppError::new("GENERATION_FAILED", "model crashed").with_retryable(true))
    }
}

fn settings(data_dir: &Path) -> Settings {
    Settings {
        data_dir: data_dir.to_path_buf(),
        chunk_size: 100,
        chunk_overlap: 20,
        min_chunk_len: 10,
        ..Settings::default()
    }
}

fn corpus() -> Vec<Document> {
    vec![
        Document::new(
            "Calibration of the pressure transmitter requires zeroing against ambient pressure before span adjustment.",
            "calibration.txt",
            DocumentType::Text,
            None,
        ),
        Document::new(
            "Wiring the loop: terminate the shield at the marshalling cabinet only, never at the field device.",
            "wiring.md",
            DocumentType::Text,
            Some(12),
        ),
    ]
}

#[test]
fn build_then_query_answers_with_ranked_sources() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = RagPipeline::new(
        settings(dir.path()),
        Box::new(ByteStatsEmbedder),
        Box::new(CannedGenerator),
    );

    let st = pipeline.build_index(&corpus()).expect("build");
    assert!(st.chunk_count > 0);
    assert_eq!(pipeline.state().expect("state"), Some(st));

    let resp = pipeline.query("How do I calibrate the transmitter?").expect("query");
    assert_eq!(resp.answer, "Grounded answer derived from the retrieved context.");
    assert!(!resp.sources.is_empty());
    assert!(!resp.context.is_empty());

    // One source per retrieved chunk, rank order, bounded scores.
    for s in &resp.sources {
        let score = s.relevance_score.expect("distance-backed score");
        assert!((0.0..=1.0).contains(&score));
    }
    let scores: Vec<f32> = resp
        .sources
        .iter()
        .map(|s| s.relevance_score.expect("score"))
        .collect();
    let mut sorted = scores.clone();
    sorted.sort_by(|x, y| y.partial_cmp(x).expect("ordered"));
    assert_eq!(scores, sorted);
}

#[test]
fn empty_corpus_yields_the_fixed_no_match_outcome() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = RagPipeline::new(
        settings(dir.path()),
        Box::new(ByteStatsEmbedder),
        Box::new(CannedGenerator),
    );

    let st = pipeline.build_index(&[]).expect("build");
    assert_eq!(st.chunk_count, 0);

    let resp = pipeline.query("Anything indexed?").expect("query");
    assert_eq!(resp.answer, NO_MATCH_ANSWER);
    assert_eq!(resp.sources, Vec::new());
    assert_eq!(resp.context, "");
}

#[test]
fn generation_fault_is_surfaced_inline_with_sources_intact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = RagPipeline::new(
        settings(dir.path()),
        Box::new(ByteStatsEmbedder),
        Box::new(BrokenGenerator),
    );
    pipeline.build_index(&corpus()).expect("build");

    let resp = pipeline.query("How do I calibrate the transmitter?").expect("query");
    assert!(resp.answer.starts_with("Error generating answer:"));
    assert!(resp.answer.contains("GENERATION_FAILED"));
    // The fault is local to generation: grounding is still attributed.
    assert!(!resp.sources.is_empty());
    assert!(!resp.context.is_empty());
}

#[test]
fn independent_rebuilds_of_one_corpus_agree_on_size() {
    let dir_a = tempfile::tempdir().expect("tempdir");
    let dir_b = tempfile::tempdir().expect("tempdir");
    let a = RagPipeline::new(
        settings(dir_a.path()),
        Box::new(ByteStatsEmbedder),
        Box::new(CannedGenerator),
    );
    let b = RagPipeline::new(
        settings(dir_b.path()),
        Box::new(ByteStatsEmbedder),
        Box::new(CannedGenerator),
    );

    let mut docs = corpus();
    let st_a = a.build_index(&docs).expect("build a");
    docs.reverse();
    let st_b = b.build_index(&docs).expect("build b");
    assert_eq!(st_a.chunk_count, st_b.chunk_count);
}

#[test]
fn rebuild_reassigns_chunk_ids_from_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = RagPipeline::new(
        settings(dir.path()),
        Box::new(ByteStatsEmbedder),
        Box::new(CannedGenerator),
    );

    pipeline.build_index(&corpus()).expect("first build");
    // Rebuild from a smaller corpus: prior ids are discarded, not merged.
    pipeline
        .build_index(&corpus()[..1])
        .expect("second build");

    let resp = pipeline.query("calibration?").expect("query");
    assert!(resp
        .sources
        .iter()
        .all(|s| s.source == "calibration.txt"));
}
