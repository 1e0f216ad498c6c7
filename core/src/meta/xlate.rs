//! Lenient conversions from raw element text into model values.
//!
//! Text that cannot be interpreted yields `None` rather than an error so partially corrupted
//! documents still surface every field that does parse.

/// Trimmed text, or `None` when nothing but whitespace remains.
pub(crate) fn xlate(text: Option<&str>) -> Option<String> {
    let trimmed = text?.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Decimal value built from the digits and dots of `text`; other characters, the minus sign
/// included, are discarded.
pub(crate) fn xlate_float(text: Option<&str>) -> Option<f64> {
    let cleaned: String =
        xlate(text)?.chars().filter(|ch| ch.is_ascii_digit() || *ch == '.').collect();
    cleaned.parse::<f64>().ok()
}

/// Integer value of `text`, truncating any fractional part.
pub(crate) fn xlate_int(text: Option<&str>) -> Option<i32> {
    xlate_float(text).map(|value| value as i32)
}

/// `yes`, `true` and `1` (any case) are true; any other present text is false.
pub(crate) fn xlate_bool(text: Option<&str>) -> Option<bool> {
    xlate(text).map(|value| is_truthy(&value))
}

pub(crate) fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "yes" | "true" | "1")
}

/// Split on `separator`, trimming every token and dropping blanks.
pub(crate) fn split(text: Option<&str>, separator: char) -> Vec<String> {
    text.map(|text| {
        text.split(separator)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(xlate(None), None);
        assert_eq!(xlate(Some("   ")), None);
        assert_eq!(xlate(Some("  Saga ")), Some("Saga".to_string()));
    }

    #[test]
    fn numbers_are_recovered_from_noisy_text() {
        assert_eq!(xlate_int(Some("12")), Some(12));
        assert_eq!(xlate_int(Some("12 issues")), Some(12));
        assert_eq!(xlate_int(Some("3.9")), Some(3));
        assert_eq!(xlate_int(Some("twelve")), None);
        assert_eq!(xlate_float(Some("4.5")), Some(4.5));
        assert_eq!(xlate_float(Some("1.2.3")), None);
        assert_eq!(xlate_float(Some("")), None);
    }

    #[test]
    fn minus_sign_is_discarded() {
        assert_eq!(xlate_int(Some("-5")), Some(5));
        assert_eq!(xlate_float(Some("-1")), Some(1.0));
    }

    #[test]
    fn booleans_accept_common_spellings() {
        assert_eq!(xlate_bool(Some("Yes")), Some(true));
        assert_eq!(xlate_bool(Some("TRUE")), Some(true));
        assert_eq!(xlate_bool(Some("1")), Some(true));
        assert_eq!(xlate_bool(Some("No")), Some(false));
        assert_eq!(xlate_bool(Some("maybe")), Some(false));
        assert_eq!(xlate_bool(None), None);
    }

    #[test]
    fn split_discards_empty_tokens() {
        assert_eq!(split(Some("Action, ,Drama,"), ','), vec!["Action", "Drama"]);
        assert!(split(None, ',').is_empty());
        assert!(split(Some(" , "), ',').is_empty());
    }
}
