//! Shared key generation for storage backends.
//!
//! Key format: `kt-forms/{millis}-{filename}`.

use ktform_core::constants::STORAGE_KEY_PREFIX;

/// Make a user-supplied filename safe to embed in a storage key.
pub fn sanitize_filename(filename: &str) -> String {
    let mut cleaned: String = filename
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    while cleaned.contains("..") {
        cleaned = cleaned.replace("..", ".");
    }
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Storage key for `filename` stamped with the given millisecond timestamp.
pub fn storage_key_at(millis: i64, filename: &str) -> String {
    format!(
        "{}/{}-{}",
        STORAGE_KEY_PREFIX,
        millis,
        sanitize_filename(filename)
    )
}

/// Filename under which a captured signature is stored.
pub fn signature_file_name(millis: i64) -> String {
    format!("signature-{}.png", millis)
}
