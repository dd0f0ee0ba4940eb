use std::sync::LazyLock;

use regex::Regex;

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
        .expect("uuid pattern")
});

/// Canonical 8-4-4-4-12 hex form, any case.
pub fn is_uuid(input: &str) -> bool {
    UUID.is_match(input)
}

/// Strips one leading and one trailing `"`, each independently.
pub fn strip_quotes(input: &str) -> &str {
    let input = input.strip_prefix('"').unwrap_or(input);

    input.strip_suffix('"').unwrap_or(input)
}

/// Crowd sizes are lenient: empty or unparsable text is `None`, never an error.
pub fn parse_count(input: &str) -> Option<i64> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return None;
    }

    trimmed.parse().ok()
}

pub fn is_checked(input: &str) -> bool {
    matches!(
        input.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid() {
        assert!(is_uuid("0b6d1c8e-3f7a-4b8e-9a51-2f0c7d9e4a10"));
        assert!(is_uuid("0B6D1C8E-3F7A-4B8E-9A51-2F0C7D9E4A10"));
        assert!(!is_uuid("not-a-uuid"));
        assert!(!is_uuid("0b6d1c8e3f7a4b8e9a512f0c7d9e4a10"));
        assert!(!is_uuid(" 0b6d1c8e-3f7a-4b8e-9a51-2f0c7d9e4a10"));
        assert!(!is_uuid("0b6d1c8e-3f7a-4b8e-9a51-2f0c7d9e4a1g"));
        assert!(!is_uuid(""));
    }

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"Flash mob\""), "Flash mob");
        assert_eq!(strip_quotes("\"leading"), "leading");
        assert_eq!(strip_quotes("trailing\""), "trailing");
        assert_eq!(strip_quotes("\"\"double\"\""), "\"double\"");
        assert_eq!(strip_quotes("plain"), "plain");
        assert_eq!(strip_quotes("\""), "");
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("250"), Some(250));
        assert_eq!(parse_count(" 350 "), Some(350));
        assert_eq!(parse_count("-4"), Some(-4));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("   "), None);
        assert_eq!(parse_count("about 200"), None);
        assert_eq!(parse_count("12.5"), None);
    }

    #[test]
    fn test_checkbox() {
        assert!(is_checked("on"));
        assert!(is_checked("TRUE"));
        assert!(is_checked("1"));
        assert!(!is_checked("off"));
        assert!(!is_checked(""));
    }
}
