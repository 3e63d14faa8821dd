//! ktform Processing Library
//!
//! Summary PDF rendering and the base64/data-URL helpers used to move binary artifacts
//! through JSON.

pub mod document;
pub mod encoding;

pub use document::{
    document_file_name, layout_record, DocumentLayout, DocumentRenderer, PdfRenderer, RenderError,
};
pub use encoding::{decode_data_url, encode_base64, split_data_url, to_data_url};
