//! Order keys for appending categories at the end of a menu.

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Key used for the first category of an empty menu.
pub const INITIAL_SORT_KEY: &str = "a0";

/// A key that sorts strictly after `prev` (byte-wise).
///
/// Increments the last incrementable base-62 digit and drops everything
/// after it; when no digit can be incremented a `0` is appended.
pub fn next_sort_key(prev: Option<&str>) -> String {
    let prev = match prev {
        Some(p) if !p.is_empty() => p,
        _ => return INITIAL_SORT_KEY.to_string(),
    };

    let chars: Vec<char> = prev.chars().collect();
    for (i, c) in chars.iter().enumerate().rev() {
        if let Some(next) = next_digit(*c) {
            let mut key: String = chars[..i].iter().collect();
            key.push(next);
            return key;
        }
    }

    format!("{prev}0")
}

fn next_digit(c: char) -> Option<char> {
    let byte = u8::try_from(c).ok()?;
    let pos = ALPHABET.iter().position(|&b| b == byte)?;
    ALPHABET.get(pos + 1).map(|&b| b as char)
}
