//! Input well-formedness rules.
//!
//! Every check returns the full list of violations so callers can report all of
//! them at once.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const MIN_PASSWORD_LEN: usize = 5;
pub const MIN_TEXT_LEN: usize = 5;
const MAX_EMAIL_LEN: usize = 254;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// A single failed rule, scoped to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldViolation {
    pub const fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

pub fn is_email(value: &str) -> bool {
    !value.is_empty() && value.len() <= MAX_EMAIL_LEN && EMAIL_REGEX.is_match(value)
}

fn is_long_enough(value: &str, min: usize) -> bool {
    !value.trim().is_empty() && value.chars().count() >= min
}

pub fn check_email(email: &str) -> Option<FieldViolation> {
    (!is_email(email)).then(|| FieldViolation::new("email", "E-Mail is invalid."))
}

pub fn check_password(password: &str) -> Option<FieldViolation> {
    (!is_long_enough(password, MIN_PASSWORD_LEN))
        .then(|| FieldViolation::new("password", "Password too short."))
}

pub fn check_title(title: &str) -> Option<FieldViolation> {
    (!is_long_enough(title, MIN_TEXT_LEN)).then(|| FieldViolation::new("title", "Title is invalid."))
}

pub fn check_content(content: &str) -> Option<FieldViolation> {
    (!is_long_enough(content, MIN_TEXT_LEN))
        .then(|| FieldViolation::new("content", "Content is invalid."))
}

/// Rules applied to a registration request.
pub fn validate_credentials(email: &str, password: &str) -> Vec<FieldViolation> {
    [check_email(email), check_password(password)]
        .into_iter()
        .flatten()
        .collect()
}

/// Rules applied to post bodies on create and update.
pub fn validate_post_input(title: &str, content: &str) -> Vec<FieldViolation> {
    [check_title(title), check_content(content)]
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_emails() {
        assert!(is_email("user@example.com"));
        assert!(is_email("test.user+tag@sub.example.co.uk"));
    }

    #[test]
    fn rejects_malformed_emails() {
        for candidate in ["", "invalid", "@example.com", "user@", "user@host", "a b@c.de"] {
            assert!(!is_email(candidate), "{candidate:?} should be rejected");
        }
    }

    #[test]
    fn password_needs_five_characters() {
        assert!(check_password("abcd").is_some());
        assert!(check_password("     ").is_some());
        assert!(check_password("abcde").is_none());
    }

    #[test]
    fn collects_every_failing_rule() {
        let violations = validate_credentials("nope", "123");
        let fields: Vec<_> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["email", "password"]);
    }

    #[test]
    fn post_rules_count_characters_not_bytes() {
        assert!(validate_post_input("ééééé", "ünïcø").is_empty());
        let violations = validate_post_input("shrt", "");
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].message, "Title is invalid.");
        assert_eq!(violations[1].field, "content");
    }
}
