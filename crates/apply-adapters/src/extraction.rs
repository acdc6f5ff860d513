//! Resume text extraction adapter.
//!
//! `apply_ports::ResumeTextExtractor` models PDF-to-text extraction as a
//! narrow port (§1: the real extraction implementation is out of scope).
//! No PDF-parsing crate is available anywhere in this workspace's retrieved
//! corpus (confirmed across all five example repos' `Cargo.toml`s), so this
//! adapter reads the source file as plain UTF-8 text/Markdown rather than
//! depending on an unvetted crate outside the corpus. Deployments that need
//! real PDF extraction swap in their own `ResumeTextExtractor` impl (e.g.
//! wrapping `pymupdf4llm` via the subprocess pattern in `claude_cli.rs`,
//! matching `examples/original_source/resume_ai/extractor.py`).

use apply_ports::{ExtractionError, ResumeTextExtractor};
use std::path::Path;
use tracing::instrument;

pub struct PlainTextResumeExtractor;

impl ResumeTextExtractor for PlainTextResumeExtractor {
    #[instrument(skip(self))]
    async fn extract(&self, source_path: &str) -> Result<String, ExtractionError> {
        if !Path::new(source_path).exists() {
            return Err(ExtractionError::Failed {
                source_path: source_path.to_string(),
                message: "file not found".to_string(),
            });
        }

        tokio::fs::read_to_string(source_path)
            .await
            .map_err(|e| ExtractionError::Failed {
                source_path: source_path.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_a_failure() {
        let extractor = PlainTextResumeExtractor;
        let result = extractor.extract("/does/not/exist.txt").await;
        assert!(matches!(result, Err(ExtractionError::Failed { .. })));
    }

    #[tokio::test]
    async fn existing_file_returns_contents() {
        let path = std::env::temp_dir().join("apply-adapters-test-extract.txt");
        tokio::fs::write(&path, "Senior Engineer at Acme").await.unwrap();
        let extractor = PlainTextResumeExtractor;
        let text = extractor.extract(path.to_str().unwrap()).await.unwrap();
        assert_eq!(text, "Senior Engineer at Acme");
        tokio::fs::remove_file(&path).await.ok();
    }
}
