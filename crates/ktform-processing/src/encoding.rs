//! Text-transport encoding for binary artifacts (base64 and data URLs).

use base64::{engine::general_purpose, Engine as _};

/// Header used when a value carries no `data:` prefix.
pub const RAW_BASE64_HEADER: &str = "application/octet-stream";

/// Split a data URL into `(header, base64 body)` at the first comma.
///
/// Values without a comma are treated as raw base64.
pub fn split_data_url(value: &str) -> (&str, &str) {
    match value.split_once(',') {
        Some((header, body)) => (header, body),
        None => (RAW_BASE64_HEADER, value),
    }
}

/// Decode a data URL (or raw base64) to bytes, ignoring embedded whitespace.
pub fn decode_data_url(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let (_, body) = split_data_url(value.trim());
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    general_purpose::STANDARD.decode(compact)
}

pub fn encode_base64(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

pub fn to_data_url(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, encode_base64(data))
}

/// MIME type declared by a data-URL header, if any (`data:image/png;base64` -> `image/png`).
pub fn data_url_mime_type(value: &str) -> Option<&str> {
    let (header, _) = value.split_once(',')?;
    let mime = header.strip_prefix("data:")?;
    let mime = mime.split(';').next().unwrap_or_default();
    if mime.is_empty() {
        None
    } else {
        Some(mime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_without_comma_is_raw_base64() {
        assert_eq!(split_data_url("QUJD"), ("application/octet-stream", "QUJD"));
        assert_eq!(
            split_data_url("data:text/plain;base64,QUJD"),
            ("data:text/plain;base64", "QUJD")
        );
    }

    #[test]
    fn decode_strips_header_and_whitespace() {
        assert_eq!(decode_data_url("data:text/plain;base64,QU\nJD ").unwrap(), b"ABC");
        assert_eq!(decode_data_url("QUJD").unwrap(), b"ABC");
        assert!(decode_data_url("data:text/plain;base64,@@@").is_err());
    }

    #[test]
    fn data_url_round_trip() {
        let url = to_data_url("image/png", &[1, 2, 3]);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), vec![1, 2, 3]);
        assert_eq!(data_url_mime_type(&url), Some("image/png"));
        assert_eq!(data_url_mime_type("QUJD"), None);
    }
}
