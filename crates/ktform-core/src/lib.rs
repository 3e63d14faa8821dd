//! ktform Core Library
//!
//! This crate provides the domain models, error types, configuration, attachment
//! accumulator and form collector shared by every ktform component.

pub mod accumulator;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use accumulator::{format_file_size, AddReport, AttachmentAccumulator, AttachmentView};
pub use config::{BaseConfig, Config, KtFormConfig};
pub use error::{AppError, ErrorMetadata, LogLevel, RETRY_MESSAGE};
pub use storage_types::StorageBackend;
pub use validation::{collect, FieldError, ValidationErrors};
