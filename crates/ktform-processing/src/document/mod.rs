//! Summary document generation
//!
//! A record is laid out into an inspectable page model ([`layout`]) and then encoded
//! to PDF bytes ([`pdf`]).

pub mod layout;
pub mod pdf;
pub mod signature;

use bytes::Bytes;
use ktform_core::models::{GeneratedDocument, SubmissionRecord};
use ktform_core::AppError;

pub use layout::{layout_record, DocumentLayout, Element, Page};
pub use signature::{decode_signature, RasterImage};

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Signature image could not be decoded: {0}")]
    Signature(String),

    #[error("PDF encoding failed: {0}")]
    Pdf(String),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::ArtifactGeneration(err.to_string())
    }
}

/// Turns a submission record into its summary document.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, record: &SubmissionRecord) -> Result<GeneratedDocument, RenderError>;
}

/// `KT_Form_<name with whitespace runs as _>_<YYYY-MM-DD>.pdf`, dated from the record.
pub fn document_file_name(record: &SubmissionRecord) -> String {
    let name = record
        .employee_name()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    format!(
        "KT_Form_{}_{}.pdf",
        name,
        record.submission_date.format("%Y-%m-%d")
    )
}

/// lopdf-backed renderer.
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    organization_name: Option<String>,
}

impl PdfRenderer {
    pub fn new(organization_name: Option<String>) -> Self {
        Self { organization_name }
    }
}

impl DocumentRenderer for PdfRenderer {
    #[tracing::instrument(skip(self, record), fields(employee = %record.employee_name()))]
    fn render(&self, record: &SubmissionRecord) -> Result<GeneratedDocument, RenderError> {
        let layout = layout_record(record, self.organization_name.as_deref());
        let bytes = pdf::encode_layout(&layout)?;
        let file_name = document_file_name(record);

        tracing::debug!(
            file_name = %file_name,
            pages = layout.page_count(),
            size_bytes = bytes.len(),
            "Summary document rendered"
        );

        Ok(GeneratedDocument::new(
            file_name,
            Bytes::from(bytes),
            layout.page_count(),
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_record;
    use super::*;

    #[test]
    fn file_name_uses_name_and_submission_date() {
        let record = sample_record();
        assert_eq!(document_file_name(&record), "KT_Form_Jane_Q_Doe_2024-06-28.pdf");
    }

    #[test]
    fn renderer_is_deterministic() {
        let renderer = PdfRenderer::new(Some("Acme".to_string()));
        let record = sample_record();
        let first = renderer.render(&record).unwrap();
        let second = renderer.render(&record).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.content_type(), "application/pdf");
        assert!(first.page_count >= 1);
    }

    #[test]
    fn render_errors_map_to_artifact_generation() {
        let err: AppError = RenderError::Pdf("boom".to_string()).into();
        assert_eq!(err.error_type(), "ArtifactGeneration");
    }
}
