use async_trait::async_trait;

use super::{CollaboratorError, TextExtractor};

/// Text extraction backed by `pdf-extract`, run off the async executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, document: &[u8]) -> Result<String, CollaboratorError> {
        let bytes = document.to_vec();
        let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|error| CollaboratorError::Malformed(format!("pdf extraction aborted: {error}")))?;

        extracted.map_err(|error| CollaboratorError::Malformed(format!("pdf extraction failed: {error}")))
    }
}
