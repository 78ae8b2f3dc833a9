use docqa_core::error::AppError;

/// Capability interface over the opaque embedding collaborator.
///
/// Order-preserving: `output[i]` is the vector for `texts[i]`, and every
/// vector has the deployment's fixed dimensionality. A failure on any item
/// fails the whole batch; callers never see partial output.
pub trait Embedder {
    fn embed(&self, model: &str, texts: &[&str]) -> Result<Vec<Vec<f32>>, AppError>;
}

pub mod ollama_embed;
