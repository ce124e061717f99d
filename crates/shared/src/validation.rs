//! Common validation utilities.

use validator::ValidationError;

lazy_static::lazy_static! {
    /// Deliberately loose: something@something.tld with no whitespace.
    pub static ref EMAIL_REGEX: regex::Regex =
        regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Returns true if the value looks like an email address.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value.trim())
}

/// Validator-compatible email format check.
pub fn validate_email_format(value: &str) -> Result<(), ValidationError> {
    if is_valid_email(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("email_format");
        err.message = Some("Invalid email address".into());
        Err(err)
    }
}

/// Validator-compatible check that a required text field is not just whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Canonical form used for comparing and storing email addresses.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Returns true if the value is exactly `digits` ASCII digits.
pub fn is_numeric_code(value: &str, digits: usize) -> bool {
    value.len() == digits && value.bytes().all(|b| b.is_ascii_digit())
}

/// Escapes the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("hello@example.com"));
        assert!(is_valid_email("first.last+tag@studio.co.uk"));
        assert!(is_valid_email("  padded@example.com  "));
    }

    #[test]
    fn test_generated_emails_are_valid() {
        for _ in 0..50 {
            let email: String = SafeEmail().fake();
            assert!(is_valid_email(&email), "{} should be valid", email);
        }
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("two words@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_validate_email_format_error_message() {
        let err = validate_email_format("nope").unwrap_err();
        assert_eq!(err.message.unwrap().to_string(), "Invalid email address");
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Acme").is_ok());
        assert!(validate_not_blank("  a  ").is_ok());
        assert!(validate_not_blank("").is_err());
        let err = validate_not_blank(" \t\n ").unwrap_err();
        assert_eq!(err.code, "blank");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Admin@Example.COM "), "admin@example.com");
    }

    #[test]
    fn test_is_numeric_code() {
        assert!(is_numeric_code("012345", 6));
        assert!(!is_numeric_code("12345", 6));
        assert!(!is_numeric_code("1234567", 6));
        assert!(!is_numeric_code("12a456", 6));
        assert!(!is_numeric_code("", 6));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }
}
