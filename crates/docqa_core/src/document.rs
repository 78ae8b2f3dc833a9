use serde::{Deserialize, Serialize};

/// What kind of acquisition produced a document. Page numbers only make
/// sense for paginated sources (`Pdf`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Pdf,
    Text,
    Web,
}

/// One raw document as supplied by an acquisition collaborator (file reader,
/// PDF extractor, scraper). Immutable; consumed once by the chunker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    /// Path or URL identifying where the content came from.
    pub source: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub page: Option<u32>,
}

impl Document {
    pub fn new(
        content: impl Into<String>,
        source: impl Into<String>,
        doc_type: DocumentType,
        page: Option<u32>,
    ) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            doc_type,
            page,
        }
    }
}
