//! Terminal output: the attachment listing and submission feedback.

use ktform_core::models::Attachment;
use ktform_core::{format_file_size, AddReport, AttachmentView, ValidationErrors};
use ktform_services::{SubmissionFeedback, SubmissionReceipt, SubmissionState};

/// Count header followed by one `name (size)` line per file; empty when nothing is held.
pub fn render_listing(attachments: &[Attachment]) -> String {
    if attachments.is_empty() {
        return String::new();
    }
    let mut out = format!("{} file(s) selected\n", attachments.len());
    for (index, file) in attachments.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {} ({})\n",
            index + 1,
            file.file_name,
            format_file_size(file.size_bytes)
        ));
    }
    out
}

/// Rejection notices for one batch of picked files.
pub fn render_rejections(report: &AddReport, max_file_bytes: u64) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.oversized.is_empty() {
        lines.push(format!(
            "Skipped, larger than {}: {}",
            format_file_size(max_file_bytes),
            report.oversized.join(", ")
        ));
    }
    if !report.duplicates.is_empty() {
        lines.push(format!(
            "Skipped, already selected: {}",
            report.duplicates.join(", ")
        ));
    }
    lines
}

/// Prints the listing to stdout whenever the accumulated set changes.
pub struct ListingView;

impl AttachmentView for ListingView {
    fn refresh(&self, attachments: &[Attachment]) {
        print!("{}", render_listing(attachments));
    }
}

/// Reports submission progress on the terminal.
pub struct ConsoleFeedback {
    pub verbose: bool,
}

impl SubmissionFeedback for ConsoleFeedback {
    fn state_changed(&self, state: SubmissionState) {
        if self.verbose {
            eprintln!("... {}", state);
        }
    }

    fn validation_failed(&self, errors: &ValidationErrors) {
        eprintln!("Please fix the following fields:");
        for error in errors.errors() {
            eprintln!("  {}: {}", error.field, error.message);
        }
    }

    fn failed(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn succeeded(&self, receipt: &SubmissionReceipt) {
        println!(
            "Form submitted successfully on {}",
            receipt.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("  request:  {}", receipt.request_id);
        println!("  document: {}", receipt.document_file_name);
        println!("  transport: {:?}", receipt.transport_mode);
    }
}
