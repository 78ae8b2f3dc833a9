use docqa_core::error::AppError;

/// Capability interface over the opaque generative collaborator.
///
/// `max_tokens` bounds the continuation length. Implementations are expected
/// to return ONLY the newly generated continuation, not an echo of the
/// prompt; the answer layer still strips a prompt prefix defensively when a
/// backend echoes anyway, but must not rely on it.
pub trait Generator {
    fn generate(&self, model: &str, prompt: &str, max_tokens: u32) -> Result<String, AppError>;
}

pub mod ollama_llm;
