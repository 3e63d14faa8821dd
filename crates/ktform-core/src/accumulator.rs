//! Attachment accumulator
//!
//! Files picked across several interactions are merged into one set, bounded per file
//! and de-duplicated by `(file name, size)`.

use std::collections::HashSet;

use crate::constants::MAX_ATTACHMENT_BYTES;
use crate::models::Attachment;

/// Receives the full listing after every mutation.
pub trait AttachmentView: Send + Sync {
    fn refresh(&self, attachments: &[Attachment]);
}

/// Names filtered out of one `add` call, grouped by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    pub accepted: Vec<String>,
    pub oversized: Vec<String>,
    pub duplicates: Vec<String>,
}

impl AddReport {
    pub fn has_rejections(&self) -> bool {
        !self.oversized.is_empty() || !self.duplicates.is_empty()
    }
}

pub struct AttachmentAccumulator {
    files: Vec<Attachment>,
    max_file_bytes: u64,
    view: Option<Box<dyn AttachmentView>>,
}

impl Default for AttachmentAccumulator {
    fn default() -> Self {
        Self::new(MAX_ATTACHMENT_BYTES)
    }
}

impl std::fmt::Debug for AttachmentAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentAccumulator")
            .field("files", &self.files.len())
            .field("max_file_bytes", &self.max_file_bytes)
            .field("has_view", &self.view.is_some())
            .finish()
    }
}

impl AttachmentAccumulator {
    pub fn new(max_file_bytes: u64) -> Self {
        Self {
            files: Vec::new(),
            max_file_bytes,
            view: None,
        }
    }

    pub fn with_view(mut self, view: Box<dyn AttachmentView>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Merge a newly selected batch into the set.
    pub fn add<I>(&mut self, batch: I) -> AddReport
    where
        I: IntoIterator<Item = Attachment>,
    {
        let mut report = AddReport::default();
        let mut seen: HashSet<(String, u64)> = self
            .files
            .iter()
            .map(|f| (f.file_name.clone(), f.size_bytes))
            .collect();

        for file in batch {
            if file.size_bytes > self.max_file_bytes {
                tracing::warn!(
                    file_name = %file.file_name,
                    size_bytes = file.size_bytes,
                    max_bytes = self.max_file_bytes,
                    "Attachment exceeds per-file limit"
                );
                report.oversized.push(file.file_name);
                continue;
            }
            if !seen.insert((file.file_name.clone(), file.size_bytes)) {
                tracing::debug!(file_name = %file.file_name, "Skipping duplicate attachment");
                report.duplicates.push(file.file_name);
                continue;
            }
            report.accepted.push(file.file_name.clone());
            self.files.push(file);
        }

        tracing::debug!(
            accepted = report.accepted.len(),
            oversized = report.oversized.len(),
            duplicates = report.duplicates.len(),
            total = self.files.len(),
            "Attachments updated"
        );
        self.notify();
        report
    }

    /// Remove the file at `index`; out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<Attachment> {
        if index >= self.files.len() {
            return None;
        }
        let removed = self.files.remove(index);
        self.notify();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.notify();
    }

    pub fn list(&self) -> impl ExactSizeIterator<Item = &Attachment> + Clone + '_ {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    /// Cheap copy of the current set (contents are reference-counted).
    pub fn snapshot(&self) -> Vec<Attachment> {
        self.files.clone()
    }

    fn notify(&self) {
        if let Some(view) = &self.view {
            view.refresh(&self.files);
        }
    }
}

/// Human-readable size using 1024 steps, e.g. `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let formatted = format!("{:.2}", value);
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", formatted, UNITS[unit])
}
