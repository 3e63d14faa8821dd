use bytes::Bytes;

use crate::constants::PDF_CONTENT_TYPE;

/// Rendered PDF summary of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub file_name: String,
    pub content: Bytes,
    pub page_count: usize,
}

impl GeneratedDocument {
    pub fn new(file_name: impl Into<String>, content: Bytes, page_count: usize) -> Self {
        Self {
            file_name: file_name.into(),
            content,
            page_count,
        }
    }

    pub fn content_type(&self) -> &'static str {
        PDF_CONTENT_TYPE
    }

    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }
}
