//! Reading form state, attachments and the signature from disk.

use anyhow::Context;
use bytes::Bytes;
use chrono::NaiveDate;
use ktform_core::constants::SIGNATURE_CONTENT_TYPE;
use ktform_core::models::{Attachment, FormState};
use ktform_processing::to_data_url;
use std::path::Path;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Parse a camelCase form-state JSON file.
pub fn load_form(path: &Path) -> anyhow::Result<FormState> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read form file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Form file {} is not valid form JSON", path.display()))
}

/// Put `today` into a blank signature date. Returns whether the field was filled.
pub fn fill_signature_date(form: &mut FormState, today: NaiveDate) -> bool {
    if !form.fields.employee_signature_date.trim().is_empty() {
        return false;
    }
    form.fields.employee_signature_date = today.format("%Y-%m-%d").to_string();
    true
}

/// Content type from the file extension, `application/octet-stream` when unknown.
pub fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}

pub fn load_attachment(path: &Path) -> anyhow::Result<Attachment> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read attachment {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Attachment path {} has no file name", path.display()))?;

    Ok(Attachment::new(
        file_name,
        mime_type_for(path),
        Bytes::from(content),
    ))
}

/// Read a PNG drawing and turn it into the data URL the collector expects.
pub fn load_signature(path: &Path) -> anyhow::Result<String> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read signature {}", path.display()))?;
    if !content.starts_with(PNG_MAGIC) {
        anyhow::bail!("Signature {} is not a PNG image", path.display());
    }
    Ok(to_data_url(SIGNATURE_CONTENT_TYPE, &content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn mime_type_follows_extension_case_insensitively() {
        assert_eq!(mime_type_for(Path::new("handover.PDF")), "application/pdf");
        assert_eq!(mime_type_for(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(
            mime_type_for(Path::new("plan.xlsx")),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(mime_type_for(Path::new("Makefile")), "application/octet-stream");
        assert_eq!(mime_type_for(Path::new("archive.7z")), "application/octet-stream");
    }

    #[test]
    fn blank_signature_date_defaults_to_today() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let mut form = FormState::default();
        form.fields.employee_signature_date = "  ".to_string();

        assert!(fill_signature_date(&mut form, today));
        assert_eq!(form.fields.employee_signature_date, "2024-06-28");
    }

    #[test]
    fn entered_signature_date_is_kept() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let mut form = FormState::default();
        form.fields.employee_signature_date = "2024-06-01".to_string();

        assert!(!fill_signature_date(&mut form, today));
        assert_eq!(form.fields.employee_signature_date, "2024-06-01");
    }

    #[test]
    fn attachment_keeps_name_size_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"handover notes").unwrap();

        let attachment = load_attachment(&path).unwrap();
        assert_eq!(attachment.file_name, "notes.txt");
        assert_eq!(attachment.size_bytes, 14);
        assert_eq!(attachment.mime_type, "text/plain");
    }

    #[test]
    fn signature_must_be_png() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("sig.png");
        let mut file = std::fs::File::create(&png).unwrap();
        file.write_all(PNG_MAGIC).unwrap();
        file.write_all(b"rest").unwrap();
        let not_png = dir.path().join("sig.jpg");
        std::fs::write(&not_png, b"\xff\xd8\xff").unwrap();

        assert!(load_signature(&png)
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert!(load_signature(&not_png).is_err());
    }

    #[test]
    fn form_file_reads_camel_case_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("form.json");
        std::fs::write(
            &path,
            r#"{"employeeName": "Jane Doe", "contacts": [{"name": "Sam", "email": "sam@example.com"}]}"#,
        )
        .unwrap();

        let form = load_form(&path).unwrap();
        assert_eq!(form.fields.employee_name, "Jane Doe");
        assert_eq!(form.contacts.len(), 1);
        assert!(load_form(&dir.path().join("missing.json")).is_err());
    }
}
