//! ktform Storage Library
//!
//! Storage abstraction for submission artifacts, with S3 (via `object_store`) and
//! local filesystem backends.
//!
//! # Storage key format
//!
//! Every artifact is written under `kt-forms/{millis}-{filename}`. Filenames are
//! sanitised so keys never contain `..`, `/` or `\` past the prefix. Key generation is
//! centralised in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use ktform_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
