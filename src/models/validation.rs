//! Input validation
//!
//! Failures are collected per field so a form can show every problem at
//! once. The API layer reports them under `details.fields`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| panic!("invalid email regex: {e}"))
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9(][0-9\s\-()]*$").unwrap_or_else(|e| panic!("invalid phone regex: {e}"))
});

/// Field name to message
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first message for a field wins
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Required, non-blank text
    pub fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("{} is required", label(field)));
        }
    }

    /// Required text of at least `min` characters
    pub fn min_len(&mut self, field: &str, value: &str, min: usize) {
        self.required(field, value);
        if !value.trim().is_empty() && value.trim().chars().count() < min {
            self.add(
                field,
                format!("{} must be at least {} characters", label(field), min),
            );
        }
    }

    /// Required, well-formed email address
    pub fn email(&mut self, field: &str, value: &str) {
        self.required(field, value);
        if !value.trim().is_empty() && !is_valid_email(value) {
            self.add(field, "Please enter a valid email address");
        }
    }

    /// Required phone number: digits with optional `+`, spaces, dashes, parentheses
    pub fn phone(&mut self, field: &str, value: &str) {
        self.required(field, value);
        if !value.trim().is_empty() && !is_valid_phone(value) {
            self.add(field, "Please enter a valid phone number");
        }
    }

    /// Email address that may be omitted
    pub fn optional_email(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            if !is_valid_email(value) {
                self.add(field, "Please enter a valid email address");
            }
        }
    }

    /// Present only when the field is being changed
    pub fn not_blank(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.required(field, value);
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join("; "))
    }
}

fn label(field: &str) -> String {
    let text = field.replace('_', " ");
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => text,
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

pub fn is_valid_phone(value: &str) -> bool {
    let value = value.trim();
    let digits = value.chars().filter(char::is_ascii_digit).count();
    PHONE_RE.is_match(value) && (7..=15).contains(&digits)
}

/// Input that can check itself before it is written
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("buyer@example.com"));
        assert!(is_valid_email(" trade@agro.co.in "));
        assert!(!is_valid_email("buyer@example"));
        assert!(!is_valid_email("buyer example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_phone_format() {
        assert!(is_valid_phone("+91 98765 43210"));
        assert!(is_valid_phone("(0291) 256-7890"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("call me"));
        assert!(!is_valid_phone("+91 98765 43210 1234567"));
    }

    #[test]
    fn test_collects_errors_per_field() {
        let mut errors = FieldErrors::new();
        errors.required("full_name", "  ");
        errors.email("email", "nope");
        errors.min_len("message", "short", 10);

        assert_eq!(errors.get("full_name"), Some("Full name is required"));
        assert_eq!(errors.get("email"), Some("Please enter a valid email address"));
        assert_eq!(
            errors.get("message"),
            Some("Message must be at least 10 characters")
        );
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_first_message_wins() {
        let mut errors = FieldErrors::new();
        errors.email("email", "");
        assert_eq!(errors.get("email"), Some("Email is required"));
    }

    #[test]
    fn test_optional_checks() {
        let mut errors = FieldErrors::new();
        errors.optional_email("email", None);
        errors.optional_email("email", Some(""));
        errors.not_blank("name", None);
        assert!(errors.into_result().is_ok());

        let mut errors = FieldErrors::new();
        errors.not_blank("name", Some(" "));
        assert!(errors.get("name").is_some());
    }

    #[test]
    fn test_serializes_as_map() {
        let mut errors = FieldErrors::new();
        errors.add("phone", "Phone is required");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({"phone": "Phone is required"})
        );
    }
}
