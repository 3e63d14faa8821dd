//! Session and request identifiers.
//!
//! Both carry a millisecond timestamp followed by a short random base36 suffix, so
//! they sort by creation time in logs and on the webhook side.

use chrono::{DateTime, Utc};
use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

/// `kt_<millis>_<9 base36 chars>`
pub fn session_id(now: DateTime<Utc>) -> String {
    format!("kt_{}_{}", now.timestamp_millis(), random_base36(9))
}

/// `req_<millis>_<5 base36 chars>`
pub fn request_id(now: DateTime<Utc>) -> String {
    format!("req_{}_{}", now.timestamp_millis(), random_base36(5))
}
