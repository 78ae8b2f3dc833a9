use docqa_core::error::AppError;

/// Endpoint plumbing for the Ollama collaborator. Both the embedding and the
/// generative capability go through one validated base URL.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
}

impl OllamaClient {
    /// Create a client for Ollama. Strictly limited to `127.0.0.1`: the
    /// models are local collaborators, never remote services.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let rejected = || {
            AppError::new(
                "OLLAMA_REMOTE_NOT_ALLOWED",
                "Ollama base URL must be localhost (127.0.0.1)",
            )
            .with_details(format!("base_url={base_url}"))
        };

        let rest = match base_url.strip_prefix("http://127.0.0.1") {
            Some(rest) => rest,
            None => return Err(rejected()),
        };
        if !rest.is_empty() {
            // Only an explicit `:port` may follow the host; no paths, no
            // userinfo, no lookalike hostnames.
            let port = match rest.strip_prefix(':') {
                Some(p) => p,
                None => return Err(rejected()),
            };
            match port.parse::<u16>() {
                Ok(p) if p != 0 => {}
                _ => return Err(rejected()),
            }
        }

        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cheap readiness probe against `/api/tags`.
    pub fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = ureq::get(&url)
            .timeout(std::time::Duration::from_millis(800))
            .call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new("OLLAMA_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(e) => Err(AppError::new(
                "OLLAMA_UNREACHABLE",
                "Failed to reach Ollama on 127.0.0.1",
            )
            .with_details(e.to_string())
            .with_retryable(true)),
        }
    }
}
