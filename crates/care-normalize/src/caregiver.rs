//! Caregiver list merging.
//!
//! Caregiver fields hold lists such as `父亲、母亲` or `母亲, 姑姑`. Tokens are
//! compared case- and space-insensitively and kept in first-seen order.

use crate::value::normalize_spacing;

/// Delimiters accepted between caregiver names, full- and half-width.
pub const CAREGIVER_DELIMITERS: &[char] = &[
    '、', ',', '，', ';', '；', '/', '／', '|', '｜', '\n', '\r',
];

/// Joiner used when writing a merged list back out.
pub const CAREGIVER_JOINER: &str = "、";

/// Split a caregiver field into normalized, de-duplicated tokens.
pub fn split_caregivers(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for part in text.split(CAREGIVER_DELIMITERS) {
        let token = normalize_spacing(part);
        if token.is_empty() {
            continue;
        }
        let key = comparison_key(&token);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        tokens.push(token);
    }
    tokens
}

/// Union of `base` tokens followed by new `candidate` tokens.
///
/// # Example
/// ```
/// use care_normalize::merge_caregivers;
///
/// assert_eq!(merge_caregivers("父亲、母亲", "母亲, 姑姑"), "父亲、母亲、姑姑");
/// ```
pub fn merge_caregivers(base: &str, candidate: &str) -> String {
    let mut merged = split_caregivers(base);
    let mut keys: Vec<String> = merged.iter().map(|token| comparison_key(token)).collect();
    for token in split_caregivers(candidate) {
        let key = comparison_key(&token);
        if !keys.contains(&key) {
            keys.push(key);
            merged.push(token);
        }
    }
    merged.join(CAREGIVER_JOINER)
}

fn comparison_key(token: &str) -> String {
    token
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
