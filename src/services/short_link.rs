//! Short recipe links: the code is the recipe id in base 62, so it is stable
//! and unique for as long as the id is.

const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn encode(id: i64) -> String {
    let mut value = id.max(0) as u64;
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 62) as usize]);
        value /= 62;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Inverse of `encode`. Codes with a leading zero digit are not canonical
/// and are rejected, so every id has exactly one code.
pub fn decode(code: &str) -> Option<i64> {
    if code.is_empty() || (code.len() > 1 && code.starts_with('0')) {
        return None;
    }

    let mut value: i64 = 0;
    for byte in code.bytes() {
        let digit = ALPHABET.iter().position(|&c| c == byte)? as i64;
        value = value.checked_mul(62)?.checked_add(digit)?;
    }
    Some(value)
}

/// Absolute short URL served under the given scheme and host.
pub fn short_url(scheme: &str, host: &str, recipe_id: i64) -> String {
    format!("{}://{}/s/{}/", scheme, host, encode(recipe_id))
}
