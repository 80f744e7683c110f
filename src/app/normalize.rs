//! Canonicalization of noisy user-entered contact identifiers.
//!
//! Phone numbers arrive as "+1 (555) 123-4567", "555-123-4567",
//! "5551234567" and must all compare equal. Normalization is pure and
//! total: degenerate input yields an empty canonical form, never an error.

/// Strips whitespace, hyphens, and parentheses anywhere in the string, then
/// one leading `+`. Keeps digits and any residual letters; does not validate
/// length. Idempotent.
pub fn normalize_phone(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace() && !matches!(ch, '-' | '(' | ')'))
        .collect();
    stripped
        .strip_prefix('+')
        .map(str::to_string)
        .unwrap_or(stripped)
}

/// True when `text` is shaped like a phone number: an optional leading `+`,
/// only digits/spaces/hyphens/parentheses after it, and at least 7 digits.
/// Used to decide whether a free-text query should also be tried as a phone
/// lookup.
pub fn is_phone_like(text: &str) -> bool {
    let text = text.trim();
    let rest = text.strip_prefix('+').unwrap_or(text);
    if rest.is_empty() {
        return false;
    }
    let shape_ok = rest
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, ' ' | '-' | '(' | ')'));
    shape_ok && rest.chars().filter(char::is_ascii_digit).count() >= 7
}

/// Escapes `%`, `_`, and `\` so user input is always matched as a literal
/// substring by `LIKE/ILIKE ... ESCAPE '\'`, never as a pattern.
pub fn escape_like_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_formatting_noise() {
        assert_eq!(normalize_phone("+1 (555) 123-4567"), "15551234567");
        assert_eq!(normalize_phone("555-123-4567"), "5551234567");
        assert_eq!(normalize_phone("  555 123 4567 "), "5551234567");
    }

    #[test]
    fn normalize_keeps_residual_letters() {
        assert_eq!(normalize_phone("+1-800-FLOWERS"), "1800FLOWERS");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["+1 (555) 123-4567", "", "5551234567", "+44 20 7946 0958"] {
            let once = normalize_phone(raw);
            assert_eq!(normalize_phone(&once), once);
        }
    }

    #[test]
    fn normalize_empty_is_empty() {
        assert_eq!(normalize_phone(""), "");
        assert_eq!(normalize_phone("+"), "");
        assert_eq!(normalize_phone(" - () "), "");
    }

    #[test]
    fn phone_like_accepts_common_shapes() {
        assert!(is_phone_like("+1 (555) 123-4567"));
        assert!(is_phone_like("5551234"));
        assert!(is_phone_like("555-123-4567"));
    }

    #[test]
    fn phone_like_rejects_short_or_wordy_input() {
        assert!(!is_phone_like("555123"));
        assert!(!is_phone_like("call me at 5551234567"));
        assert!(!is_phone_like("shadycompany.example"));
        assert!(!is_phone_like(""));
        assert!(!is_phone_like("+"));
    }

    #[test]
    fn escape_makes_input_literal() {
        assert_eq!(escape_like_pattern("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like_pattern("a\\b"), "a\\\\b");
        assert_eq!(escape_like_pattern("plain"), "plain");
    }
}
