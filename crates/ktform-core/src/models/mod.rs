//! Data models for the submission pipeline
//!
//! Raw form input, the validated submission record, per-artifact upload outcomes, the
//! outbound webhook payload, and session analytics.

mod analytics;
mod document;
mod form;
mod payload;
mod submission;
mod upload;

// Re-export all models for convenient imports
pub use analytics::*;
pub use document::*;
pub use form::*;
pub use payload::*;
pub use submission::*;
pub use upload::*;
