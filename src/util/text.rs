//! Text normalization and fingerprint hashing.
//!
//! The fingerprint hash is deliberately lightweight (not cryptographic):
//! it backs dedupe hints, not uniqueness guarantees.

use once_cell::sync::Lazy;
use regex::Regex;

// Keeps latin, digits, cyrillic, and the handful of symbols that carry
// meaning in role titles (c#, c++, node.js, e-commerce).
static NON_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9а-яё#+.\s-]").expect("valid pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid pattern"));

/// Lowercase, strip non-token characters, collapse whitespace.
#[must_use]
pub fn normalize_text(s: &str) -> String {
    let lower = s.to_lowercase();
    let stripped = NON_TOKEN.replace_all(&lower, " ");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// djb2-style rolling hash: seed 5381, multiply by 33, XOR-combine each
/// UTF-16 code unit, reduced to unsigned 32 bits and base36-encoded.
#[must_use]
pub fn djb2_hash(input: &str) -> String {
    let mut hash: u32 = 5381;
    for unit in input.encode_utf16() {
        hash = hash.wrapping_mul(33) ^ u32::from(unit);
    }
    to_base36(hash)
}

fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ascii")
}
