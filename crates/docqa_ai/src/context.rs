use crate::retrieve::RetrievalResult;

/// Display previews are cut at this many characters.
pub const PREVIEW_MAX_CHARS: usize = 500;

/// The grounding text for one query: `full` feeds the generator, `preview`
/// is the bounded version returned to callers for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    pub full: String,
    pub preview: String,
}

/// Concatenates result contents in rank order, blank-line separated. No
/// de-duplication: near-identical chunks from overlapping windows are
/// intentionally preserved.
pub fn assemble(results: &[RetrievalResult]) -> AssembledContext {
    let full = results
        .iter()
        .map(|r| r.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let preview = preview_of(&full);
    AssembledContext { full, preview }
}

fn preview_of(full: &str) -> String {
    let mut iter = full.char_indices();
    match iter.nth(PREVIEW_MAX_CHARS) {
        // More than the budget: cut at the char boundary and mark truncation.
        Some((byte_idx, _)) => format!("{}...", &full[..byte_idx]),
        None => full.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use docqa_core::chunker::ChunkMetadata;
    use docqa_core::document::DocumentType;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::retrieve::RetrievalResult;

    fn result(content: &str, chunk_id: u32) -> RetrievalResult {
        RetrievalResult {
            content: content.to_string(),
            metadata: ChunkMetadata {
                source: "manual.txt".to_string(),
                doc_type: DocumentType::Text,
                page: None,
                chunk_id,
            },
            distance: Some(0.1),
        }
    }

    #[test]
    fn joins_in_rank_order_with_blank_lines() {
        let ctx = assemble(&[result("first", 0), result("second", 1), result("first", 2)]);
        assert_eq!(ctx.full, "first\n\nsecond\n\nfirst");
        assert_eq!(ctx.preview, ctx.full);
    }

    #[test]
    fn preview_is_bounded_and_marked() {
        let long = "x".repeat(1200);
        let ctx = assemble(&[result(&long, 0)]);
        assert_eq!(ctx.full.chars().count(), 1200);
        assert_eq!(ctx.preview.chars().count(), PREVIEW_MAX_CHARS + 3);
        assert!(ctx.preview.ends_with("..."));
    }

    #[test]
    fn preview_cut_respects_multibyte_boundaries() {
        let long = "ü".repeat(600);
        let ctx = assemble(&[result(&long, 0)]);
        assert!(ctx.preview.ends_with("..."));
        assert_eq!(ctx.preview.chars().count(), PREVIEW_MAX_CHARS + 3);
    }

    #[test]
    fn exactly_at_budget_is_not_truncated() {
        let exact = "y".repeat(PREVIEW_MAX_CHARS);
        let ctx = assemble(&[result(&exact, 0)]);
        assert_eq!(ctx.preview, ctx.full);
    }

    #[test]
    fn empty_results_assemble_to_empty_context() {
        let ctx = assemble(&[]);
        assert_eq!(ctx.full, "");
        assert_eq!(ctx.preview, "");
    }
}
