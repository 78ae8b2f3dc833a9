use tracing::warn;

use crate::llm::Generator;

/// Continuation budget on top of the prompt's own word count.
pub const CONTINUATION_BUDGET: u32 = 200;

/// The fixed grounding template. The context goes in verbatim, the question
/// after it, and the trailing "Answer:" cue starts the continuation.
pub fn build_prompt(domain_label: &str, context: &str, question: &str) -> String {
    format!(
        "Context about {domain_label}:\n{context}\n\nQuestion: {question}\n\nAnswer:"
    )
}

/// Keeps only the newly generated continuation. Backends are assumed to
/// return the continuation alone; if one echoes the prompt first, the echo is
/// stripped rather than shown to the user.
pub fn extract_continuation(prompt: &str, raw: &str) -> String {
    match raw.strip_prefix(prompt) {
        Some(rest) => rest.trim().to_string(),
        None => raw.trim().to_string(),
    }
}

/// Produces a grounded answer, or a textual explanation of why there is
/// none. Generation faults are recovered locally into the answer string so a
/// query never fails structurally on a generation error ("answer or explain
/// why not"); retrieval and indexing faults stay hard errors elsewhere.
pub fn answer(
    generator: &dyn Generator,
    model: &str,
    domain_label: &str,
    question: &str,
    context: &str,
) -> String {
    let prompt = build_prompt(domain_label, context, question);
    let max_tokens = prompt.split_whitespace().count() as u32 + CONTINUATION_BUDGET;

    match generator.generate(model, &prompt, max_tokens) {
        Ok(raw) => extract_continuation(&prompt, &raw),
        Err(e) => {
            warn!(code = %e.code, "generation failed; answering with the failure");
            format!("Error generating answer: {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use docqa_core::error::AppError;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::llm::Generator;

    struct EchoingGenerator;

    impl Generator for EchoingGenerator {
        fn generate(&self, _model: &str, prompt: &str, _max_tokens: u32) -> Result<String, AppError> {
            Ok(format!("{prompt} The transmitter must be zeroed first."))
        }
    }

    struct PlainGenerator;

    impl Generator for PlainGenerator {
        fn generate(&self, _model: &str, _prompt: &str, _max_tokens: u32) -> Result<String, AppError> {
            Ok("  The transmitter must be zeroed first.  ".to_string())
        }
    }

    struct FailingGenerator;

    impl Generator for FailingGenerator {
        fn generate(&self, _model: &str, _prompt: &str, _max_tokens: u32) -> Result<String, AppError> {
            Err(AppError::new("GENERATION_FAILED", "model not loaded").with_retryable(true))
        }
    }

    struct BudgetProbe {
        expected: u32,
    }

    impl Generator for BudgetProbe {
        fn generate(&self, _model: &str, _prompt: &str, max_tokens: u32) -> Result<String, AppError> {
            assert_eq!(max_tokens, self.expected);
            Ok("ok".to_string())
        }
    }

    #[test]
    fn prompt_follows_the_fixed_template() {
        let p = build_prompt("pump documentation", "ctx line", "how?");
        assert_eq!(
            p,
            "Context about pump documentation:\nctx line\n\nQuestion: how?\n\nAnswer:"
        );
    }

    #[test]
    fn echoed_prompt_is_stripped() {
        let out = answer(&EchoingGenerator, "m", "docs", "q", "ctx");
        assert_eq!(out, "The transmitter must be zeroed first.");
    }

    #[test]
    fn non_echoing_output_is_used_as_is() {
        let out = answer(&PlainGenerator, "m", "docs", "q", "ctx");
        assert_eq!(out, "The transmitter must be zeroed first.");
    }

    #[test]
    fn generation_failure_becomes_an_answer_string() {
        let out = answer(&FailingGenerator, "m", "docs", "q", "ctx");
        assert!(out.starts_with("Error generating answer:"));
        assert!(out.contains("GENERATION_FAILED"));
    }

    #[test]
    fn budget_is_prompt_words_plus_continuation() {
        // "Context about the docs:\nsome context\n\nQuestion: q\n\nAnswer:"
        let prompt = build_prompt("the docs", "some context", "q");
        let expected = prompt.split_whitespace().count() as u32 + CONTINUATION_BUDGET;
        let _ = answer(&BudgetProbe { expected }, "m", "the docs", "q", "some context");
    }
}
