//! Application-wide constants.

/// Per-file ceiling enforced by the attachment accumulator (5 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Serialized webhook payload ceiling, in characters, before binary fields are
/// replaced by metadata-only stand-ins.
pub const MAX_PAYLOAD_CHARS: usize = 10_000_000;

/// Version stamped into every submission record.
pub const FORM_VERSION: &str = "1.0";

/// Prefix for every object written by the durable upload stage.
pub const STORAGE_KEY_PREFIX: &str = "kt-forms";

/// Default relay route, kept compatible with deployed front ends.
pub const DEFAULT_RELAY_PATH: &str = "/make-proxy";

/// Content type of the generated summary document.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Content type of the captured signature bitmap.
pub const SIGNATURE_CONTENT_TYPE: &str = "image/png";
