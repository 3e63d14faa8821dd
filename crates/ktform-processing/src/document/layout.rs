//! Page model for the knowledge-transfer summary.
//!
//! Layout works in millimetres from the top-left corner of an A4 page. The PDF encoder
//! converts to points and flips the vertical axis.

use chrono::SecondsFormat;
use ktform_core::models::SubmissionRecord;

use super::signature::{decode_signature, RasterImage};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 25.0;
pub const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
/// A field or header starting below this offset moves to a new page.
pub const PAGE_BREAK_MM: f32 = 250.0;
/// Where content resumes on a continuation page.
pub const PAGE_TOP_MM: f32 = 20.0;

const HEADER_TOP_MM: f32 = 15.0;
// Lines never run into the footer band.
const LAST_LINE_MM: f32 = PAGE_HEIGHT_MM - 20.0;
// Line advance per point of font size, in mm.
const LINE_FACTOR: f32 = 0.4;
// Average Helvetica glyph width, in ems.
const GLYPH_WIDTH_EM: f32 = 0.5;
const PT_TO_MM: f32 = 25.4 / 72.0;

const SIGNATURE_BOX_WIDTH_MM: f32 = 80.0;
const SIGNATURE_BOX_HEIGHT_MM: f32 = 32.0;

pub const TITLE: &str = "Employee Knowledge Transfer Form";
pub const NO_SIGNATURE_MARKER: &str = "[No signature provided]";
pub const UNEMBEDDABLE_SIGNATURE_MARKER: &str = "[Signature captured but could not be embedded]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const ACCENT: Rgb = Rgb(37, 99, 235);
pub const MUTED: Rgb = Rgb(100, 100, 100);
pub const FOOTER_GREY: Rgb = Rgb(128, 128, 128);
pub const RULE_GREY: Rgb = Rgb(200, 200, 200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// `y` is the baseline
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
        color: Rgb,
        text: String,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        color: Rgb,
    },
    /// `y` is the top edge
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        raster: RasterImage,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn has_image(&self) -> bool {
        self.elements
            .iter()
            .any(|e| matches!(e, Element::Image { .. }))
    }
}

/// Fully laid-out document, ready for encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pages: Vec<Page>,
}

impl DocumentLayout {
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages
            .iter()
            .flat_map(Page::texts)
            .any(|t| t.contains(needle))
    }
}

struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: HEADER_TOP_MM,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = PAGE_TOP_MM;
    }

    fn break_if_needed(&mut self) {
        if self.y > PAGE_BREAK_MM {
            self.new_page();
        }
    }

    fn push(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn text(&mut self, text: &str, x: f32, max_width: f32, size: f32, weight: FontWeight, color: Rgb) {
        let line_height = size * LINE_FACTOR;
        for line in wrap_text(text, max_width, size) {
            if self.y > LAST_LINE_MM {
                self.new_page();
            }
            self.push(Element::Text {
                x,
                y: self.y,
                size,
                weight,
                color,
                text: line,
            });
            self.y += line_height;
        }
        self.y += 5.0;
    }

    fn section(&mut self, title: &str) {
        self.break_if_needed();
        self.text(title, MARGIN_MM, CONTENT_WIDTH_MM, 14.0, FontWeight::Bold, ACCENT);
        self.y += 5.0;
    }

    fn field(&mut self, label: &str, value: &str) {
        if value.trim().is_empty() {
            return;
        }
        self.break_if_needed();
        self.text(
            &format!("{}:", label),
            MARGIN_MM,
            CONTENT_WIDTH_MM,
            10.0,
            FontWeight::Bold,
            BLACK,
        );
        self.text(
            value,
            MARGIN_MM + 10.0,
            CONTENT_WIDTH_MM - 10.0,
            10.0,
            FontWeight::Regular,
            BLACK,
        );
        self.y += 3.0;
    }

    fn image(&mut self, raster: RasterImage) {
        self.break_if_needed();
        let scale = (SIGNATURE_BOX_WIDTH_MM / raster.width as f32)
            .min(SIGNATURE_BOX_HEIGHT_MM / raster.height as f32);
        let width = raster.width as f32 * scale;
        let height = raster.height as f32 * scale;
        if self.y + height > LAST_LINE_MM {
            self.new_page();
        }
        let y = self.y;
        self.push(Element::Image {
            x: MARGIN_MM,
            y,
            width,
            height,
            raster,
        });
        self.y += height + 10.0;
    }

    fn finish(mut self) -> DocumentLayout {
        let total = self.pages.len();
        for (index, page) in self.pages.iter_mut().enumerate() {
            page.elements.push(Element::Text {
                x: PAGE_WIDTH_MM - 30.0,
                y: PAGE_HEIGHT_MM - 10.0,
                size: 8.0,
                weight: FontWeight::Regular,
                color: FOOTER_GREY,
                text: format!("Page {} of {}", index + 1, total),
            });
        }
        DocumentLayout { pages: self.pages }
    }
}

/// Lay out a record. Deterministic: every date comes from the record itself.
pub fn layout_record(record: &SubmissionRecord, organization: Option<&str>) -> DocumentLayout {
    let mut c = Cursor::new();
    let f = &record.fields;

    match organization.map(str::trim).filter(|o| !o.is_empty()) {
        Some(org) => {
            c.text(org, MARGIN_MM, CONTENT_WIDTH_MM, 20.0, FontWeight::Bold, ACCENT);
            c.text(TITLE, MARGIN_MM, CONTENT_WIDTH_MM, 12.0, FontWeight::Regular, MUTED);
        }
        None => c.text(TITLE, MARGIN_MM, CONTENT_WIDTH_MM, 20.0, FontWeight::Bold, ACCENT),
    }
    c.push(Element::Rule {
        x1: MARGIN_MM,
        x2: PAGE_WIDTH_MM - MARGIN_MM,
        y: c.y,
        color: RULE_GREY,
    });
    c.y += 10.0;

    c.section("Section 1: Employee Details");
    c.field("Employee Name", &f.employee_name);
    c.field("Designation/Role", &f.designation);
    c.field("Department/Team", &f.department);
    c.field("Reporting Manager Name", &f.reporting_manager_name);
    c.field("Reporting Manager Email", &f.reporting_manager_email);
    c.field("Employee ID", &f.employee_id);
    c.field("Date of Joining", &f.date_of_joining);
    c.field("Last Working Day", &f.last_working_day);

    c.section("Section 2: Knowledge Transfer Overview");
    c.field("Current Responsibilities", &f.current_responsibilities);
    c.field("Ongoing Projects/Tasks", &f.ongoing_projects);
    c.field("Tools/Systems Used", &f.tools_systems);
    c.field("Key Documents/Files Location", &f.key_documents);
    c.field("Standard Operating Procedures", &f.sops);

    c.section("Section 3: Key Contacts");
    for (index, contact) in record.contacts.iter().enumerate() {
        let value = match (contact.name.is_empty(), contact.email.is_empty()) {
            (false, false) => format!("{} - {}", contact.name, contact.email),
            (false, true) => contact.name.clone(),
            _ => contact.email.clone(),
        };
        c.field(&format!("Contact {}", index + 1), &value);
    }

    c.section("Section 4: Handover Details");
    c.field("Successor/Replacement", &f.successor);
    c.field("Areas Fully Handed Over", &f.areas_handed_over);
    c.field("Areas Pending", &f.areas_pending);

    c.section("Section 5: Access & Credentials");
    for (index, access) in record.access_entries.iter().enumerate() {
        c.field(
            &format!("Access {}", index + 1),
            &format!("{} (Action: {})", access.credentials, access.action),
        );
    }

    c.section("Section 6: Digital Signatures");
    c.field("Employee Signature Date", &f.employee_signature_date);
    c.field(
        "Submission Date",
        &record
            .submission_date
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    );
    c.y += 10.0;

    match record.signature.as_deref() {
        None => c.field("Employee Signature", NO_SIGNATURE_MARKER),
        Some(data_url) => match decode_signature(data_url) {
            Ok(raster) => c.image(raster),
            Err(e) => {
                tracing::warn!(error = %e, "Signature could not be embedded in document");
                c.field("Employee Signature", UNEMBEDDABLE_SIGNATURE_MARKER);
            }
        },
    }

    c.finish()
}

/// Greedy word wrap against an average glyph width. Explicit newlines are kept and
/// words longer than a line are split.
pub fn wrap_text(text: &str, max_width_mm: f32, font_size: f32) -> Vec<String> {
    let glyph_mm = font_size * GLYPH_WIDTH_EM * PT_TO_MM;
    let max_chars = ((max_width_mm / glyph_mm).floor() as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in paragraph.split_whitespace() {
            let mut word = word;
            while word.chars().count() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let split = word
                    .char_indices()
                    .nth(max_chars)
                    .map(|(i, _)| i)
                    .unwrap_or(word.len());
                lines.push(word[..split].to_string());
                word = &word[split..];
            }
            if word.is_empty() {
                continue;
            }
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::test_support::{record_with_contacts, sample_record, signature_png_data_url};

    fn footers(layout: &DocumentLayout) -> Vec<String> {
        layout
            .pages()
            .iter()
            .map(|p| {
                p.texts()
                    .filter(|t| t.starts_with("Page "))
                    .map(str::to_string)
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .collect()
    }

    #[test]
    fn every_page_gets_a_numbered_footer() {
        let layout = layout_record(&record_with_contacts(60), None);
        let total = layout.page_count();
        assert!(total > 1);
        for (index, footer) in footers(&layout).iter().enumerate() {
            assert_eq!(footer, &format!("Page {} of {}", index + 1, total));
        }
    }

    #[test]
    fn page_count_is_monotonic_in_field_count() {
        let mut previous = 0;
        for contacts in [1, 5, 10, 20, 40, 80, 120] {
            let pages = layout_record(&record_with_contacts(contacts), None).page_count();
            assert!(pages >= previous, "{contacts} contacts gave {pages} pages");
            previous = pages;
        }
        assert!(previous > 1);
    }

    #[test]
    fn text_never_enters_the_footer_band() {
        let layout = layout_record(&record_with_contacts(80), None);
        for page in layout.pages() {
            for element in &page.elements {
                if let Element::Text { y, text, .. } = element {
                    if !text.starts_with("Page ") {
                        assert!(*y <= LAST_LINE_MM + 0.01, "{text} at {y}");
                    }
                }
            }
        }
    }

    #[test]
    fn empty_optional_fields_are_omitted() {
        let record = sample_record();
        let layout = layout_record(&record, None);
        assert!(layout.contains_text("Employee Name:"));
        assert!(!layout.contains_text("Areas Pending:"));
        assert!(layout.contains_text("Contact 1:"));
        assert!(layout.contains_text("VPN (Action: Transfer and Deactivate)"));
    }

    #[test]
    fn signature_markers() {
        let mut record = sample_record();
        record.signature = None;
        assert!(layout_record(&record, None).contains_text(NO_SIGNATURE_MARKER));

        record.signature = Some("data:image/png;base64,bm90IGEgcG5n".to_string());
        assert!(layout_record(&record, None).contains_text(UNEMBEDDABLE_SIGNATURE_MARKER));

        record.signature = Some(signature_png_data_url());
        let layout = layout_record(&record, None);
        assert!(layout.pages().iter().any(Page::has_image));
        assert!(!layout.contains_text(UNEMBEDDABLE_SIGNATURE_MARKER));
    }

    #[test]
    fn organisation_header_is_optional() {
        let record = sample_record();
        let layout = layout_record(&record, Some("Acme Holdings"));
        assert!(layout.contains_text("Acme Holdings"));
        assert!(layout.contains_text(TITLE));
    }

    #[test]
    fn wrap_respects_width_and_newlines() {
        let lines = wrap_text("alpha beta gamma delta", 20.0, 10.0);
        // 20mm at 10pt holds 11 glyphs
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);

        let lines = wrap_text("first\n\nsecond", 100.0, 10.0);
        assert_eq!(lines, vec!["first", "", "second"]);

        let lines = wrap_text(&"x".repeat(25), 20.0, 10.0);
        assert_eq!(lines.iter().map(String::len).collect::<Vec<_>>(), vec![11, 11, 3]);
    }
}
