use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::document::{Document, DocumentType};
use crate::error::AppError;

/// Extensions the filesystem loader reads directly. PDF and HTML need an
/// extraction collaborator and are not acquired here.
const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// One document that could not be loaded, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a corpus load. Per-document failures never abort the load;
/// they land in `skipped` so callers can report a partial corpus instead of
/// silently pretending the failures never happened.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedDocument>,
}

fn collect_candidate_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(e) => e,
            Err(_) => continue,
        };
        for ent in entries.flatten() {
            let path = ent.path();
            if path.is_dir() {
                stack.push(path);
            } else if path
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
            {
                out.push(path);
            }
        }
    }
    // Deterministic corpus order regardless of directory iteration order.
    out.sort();
    out
}

/// Loads every `.txt`/`.md` file under `docs_dir` (recursively) as one
/// whole-file `Document`. Unreadable and empty files are logged and recorded
/// in the report, never fatal. A missing directory is an empty corpus.
pub fn load_documents(docs_dir: &Path) -> Result<LoadReport, AppError> {
    if !docs_dir.is_dir() {
        warn!(path = %docs_dir.display(), "docs directory missing; corpus is empty");
        return Ok(LoadReport::default());
    }

    let mut report = LoadReport::default();
    for path in collect_candidate_files(docs_dir) {
        match fs::read_to_string(&path) {
            Ok(content) => {
                if content.trim().is_empty() {
                    warn!(path = %path.display(), "skipping empty document");
                    report.skipped.push(SkippedDocument {
                        path,
                        reason: "file contains no text".to_string(),
                    });
                    continue;
                }
                report.documents.push(Document::new(
                    content,
                    path.display().to_string(),
                    DocumentType::Text,
                    None,
                ));
            }
            Err(e) => {
                warn!(path = %path.display(), err = %e, "skipping unreadable document");
                report.skipped.push(SkippedDocument {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        loaded = report.documents.len(),
        skipped = report.skipped.len(),
        "corpus load complete"
    );
    Ok(report)
}
