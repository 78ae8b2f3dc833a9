use docqa_core::error::AppError;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::ollama::OllamaClient;

/// Longest input forwarded to the collaborator. Chunking keeps texts well
/// under this; the guard only matters for unchunked caller input.
const MAX_INPUT_BYTES: usize = 12_000;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

fn clip_to_char_boundary(input: &str, max_bytes: usize) -> &str {
    if input.len() <= max_bytes {
        return input;
    }
    let mut end = max_bytes;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}

impl OllamaEmbedder {
    fn embed_one(&self, model: &str, input: &str) -> Result<Vec<f32>, AppError> {
        let prompt = clip_to_char_boundary(input, MAX_INPUT_BYTES);

        let url = format!("{}/api/embeddings", self.client.base_url());
        let req = EmbeddingsRequest { model, prompt };
        let resp = ureq::post(&url)
            .timeout(std::time::Duration::from_secs(10))
            .send_json(serde_json::to_value(req).map_err(|e| {
                AppError::new("EMBEDDINGS_FAILED", "Failed to encode embeddings request")
                    .with_details(e.to_string())
            })?);

        match resp {
            Ok(r) if r.status() == 200 => {
                let v: EmbeddingsResponse = r.into_json().map_err(|e| {
                    AppError::new("EMBEDDINGS_FAILED", "Failed to decode embeddings response")
                        .with_details(e.to_string())
                })?;
                if v.embedding.is_empty() {
                    return Err(AppError::new(
                        "EMBEDDINGS_FAILED",
                        "Embeddings response was empty",
                    ));
                }
                Ok(v.embedding)
            }
            Ok(r) => Err(
                AppError::new("EMBEDDINGS_FAILED", "Embeddings request failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(
                AppError::new("EMBEDDINGS_FAILED", "Failed to call embeddings endpoint")
                    .with_details(e.to_string())
                    .with_retryable(true),
            ),
        }
    }
}

impl Embedder for OllamaEmbedder {
    /// The collaborator API takes one prompt per request; the batch contract
    /// is preserved by issuing the requests in input order and failing the
    /// whole batch on the first error.
    fn embed(&self, model: &str, texts: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        let mut out = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            let v = self.embed_one(model, text).map_err(|mut e| {
                e.details = Some(match e.details.take() {
                    Some(d) => format!("batch_item={i}; {d}"),
                    None => format!("batch_item={i}"),
                });
                e
            })?;
            out.push(v);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::clip_to_char_boundary;

    #[test]
    fn clip_never_splits_a_multibyte_char() {
        let s = "é".repeat(10);
        let clipped = clip_to_char_boundary(&s, 5);
        assert_eq!(clipped, "éé");
        assert_eq!(clip_to_char_boundary("abc", 5), "abc");
    }
}
