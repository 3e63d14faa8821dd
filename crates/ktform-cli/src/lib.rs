//! ktform CLI support
//!
//! File loading and terminal output shared by the `ktform` binary.

pub mod console;
pub mod input;

pub use console::{render_listing, render_rejections, ConsoleFeedback, ListingView};
pub use input::{fill_signature_date, load_attachment, load_form, load_signature, mime_type_for};
