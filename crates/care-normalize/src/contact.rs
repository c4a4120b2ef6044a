//! Contact token extraction from free-text family fields.
//!
//! Caregivers type contacts as one string, e.g. `张伟 13912345678 110101199001011234`.
//! The phone is matched and removed first so its digits cannot be read as
//! part of an identity number; the identity number is matched and removed
//! next; what remains is the display name.

use std::sync::LazyLock;

use care_model::{ContactRole, FamilyContact};
use regex::Regex;

use crate::identity::normalize_id_number;
use crate::value::{normalize_spacing, normalize_value};

/// Mainland mobile number: 11 digits starting with `1[3-9]`, not embedded in a longer digit run.
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])(1[3-9][0-9]{9})(?:[^0-9]|$)").expect("Invalid phone regex")
});

/// 18-character identity number (17 digits plus digit or `X`) or the legacy 15-digit form.
static ID_NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{17}[0-9Xx]|[0-9]{15})(?:[^0-9Xx]|$)")
        .expect("Invalid identity number regex")
});

const BRACKETS: &[char] = &[
    '(', ')', '（', '）', '[', ']', '【', '】', '{', '}', '<', '>', '《', '》',
];

/// Separators left dangling at the edges once tokens are removed.
const EDGE_PUNCTUATION: &[char] = &[
    ',', '，', ':', '：', ';', '；', '、', '-', '/', '|', ' ',
];

/// Field labels that are not part of a name.
const LABELS: &[&str] = &["身份证号码", "身份证号", "身份证", "联系电话", "电话", "手机"];

/// Find the first phone number in `text`.
pub fn find_phone(text: &str) -> Option<&str> {
    PHONE_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Find the first identity number in `text`.
pub fn find_id_number(text: &str) -> Option<&str> {
    ID_NUMBER_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Extract a structured contact from one free-text field.
///
/// Returns `None` when the field is empty. The name falls back to the full
/// trimmed text when nothing else is left after extraction.
///
/// # Example
/// ```
/// use care_model::ContactRole;
/// use care_normalize::extract_contact;
///
/// let contact = extract_contact(ContactRole::Mother, "李梅 13700001111 110101199002022222").unwrap();
/// assert_eq!(contact.name, "李梅");
/// assert_eq!(contact.phone.as_deref(), Some("13700001111"));
/// assert_eq!(contact.id_number.as_deref(), Some("110101199002022222"));
/// ```
pub fn extract_contact(role: ContactRole, text: &str) -> Option<FamilyContact> {
    let raw = normalize_value(text);
    if raw.is_empty() {
        return None;
    }

    let mut rest = raw.clone();
    let phone = take_match(&mut rest, &PHONE_PATTERN);
    let id_number = take_match(&mut rest, &ID_NUMBER_PATTERN).map(|id| normalize_id_number(&id));

    let name = residual_name(&rest);
    let name = if name.is_empty() { raw.clone() } else { name };

    Some(FamilyContact {
        role,
        raw,
        name,
        phone,
        id_number,
    })
}

/// Remove the first match of capture group 1 from `text`, returning it.
fn take_match(text: &mut String, pattern: &Regex) -> Option<String> {
    let range = pattern.captures(text)?.get(1)?.range();
    let found = text[range.clone()].to_string();
    text.replace_range(range, " ");
    Some(found)
}

fn residual_name(rest: &str) -> String {
    let mut cleaned: String = rest.chars().filter(|c| !BRACKETS.contains(c)).collect();
    for label in LABELS {
        cleaned = cleaned.replace(label, " ");
    }
    let spaced = normalize_spacing(&cleaned);
    spaced.trim_matches(EDGE_PUNCTUATION).to_string()
}
