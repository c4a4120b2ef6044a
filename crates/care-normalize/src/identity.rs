//! Normalized comparison keys for names, identity numbers and phones.

use crate::value::normalize_value;

/// Normalize an identity-document number: keep digits and `X`, upper-cased.
pub fn normalize_id_number(value: &str) -> String {
    normalize_value(value)
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, 'x' | 'X'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Normalize a phone number to its ASCII digits.
pub fn normalize_phone(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Name-key used for candidate lookup: whitespace stripped, lower-cased.
///
/// Distinct from the group key.
pub fn name_key(name: &str) -> String {
    normalize_value(name)
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Keep only ASCII alphanumerics, `_` and `-`.
pub fn sanitize_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_id_number() {
        assert_eq!(normalize_id_number(" 1101 0119 9001 01123x "), "11010119900101123X");
        assert_eq!(normalize_id_number("身份证：110101199001011234"), "110101199001011234");
        assert_eq!(normalize_id_number("null"), "");
        assert_eq!(normalize_id_number("无"), "");
    }

    #[test]
    fn test_name_key_ignores_spacing_and_case() {
        assert_eq!(name_key("张 三"), "张三");
        assert_eq!(name_key("张\u{3000}三"), "张三");
        assert_eq!(name_key(" Li Si "), "lisi");
        assert_eq!(name_key("undefined"), "");
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("P-001/ward_3"), "P-001ward_3");
        assert_eq!(sanitize_key("王五"), "");
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("138-0000-0000"), "13800000000");
    }
}
