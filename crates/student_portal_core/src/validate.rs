//! crates/student_portal_core/src/validate.rs
//!
//! Client-side form checks, applied before a student payload is sent so the
//! user sees the same rules the backend enforces without a round trip.

use crate::domain::{NewStudent, StudentUpdate};
use crate::ports::{PortError, PortResult};
use regex::Regex;
use std::sync::OnceLock;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
    })
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?1?\d{9,15}$").expect("valid phone regex"))
}

pub fn validate_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Dashes and spaces are ignored.
pub fn validate_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| *c != '-' && *c != ' ').collect();
    phone_pattern().is_match(&compact)
}

/// At least 8 characters with one letter and one digit.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err("Password must contain at least one letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number");
    }
    Ok(())
}

/// Trims, and truncates to `max_length` characters when given.
pub fn sanitize(text: &str, max_length: Option<usize>) -> String {
    let trimmed = text.trim();
    match max_length {
        Some(max) => trimmed.chars().take(max).collect(),
        None => trimmed.to_string(),
    }
}

fn check_common(email: &str, first: &str, last: &str, phone: Option<&str>) -> PortResult<()> {
    if !validate_email(email) {
        return Err(PortError::Invalid(format!("'{}' is not a valid email", email)));
    }
    if first.trim().is_empty() || last.trim().is_empty() {
        return Err(PortError::Invalid("First and last name are required".into()));
    }
    if let Some(phone) = phone.filter(|p| !p.trim().is_empty()) {
        if !validate_phone(phone) {
            return Err(PortError::Invalid(format!("'{}' is not a valid phone number", phone)));
        }
    }
    Ok(())
}

impl NewStudent {
    pub fn validate(&self) -> PortResult<()> {
        if self.username.trim().is_empty() {
            return Err(PortError::Invalid("Username is required".into()));
        }
        validate_password(&self.password).map_err(|m| PortError::Invalid(m.to_string()))?;
        check_common(
            &self.email,
            &self.first_name,
            &self.last_name,
            self.phone.as_deref(),
        )
    }
}

impl StudentUpdate {
    pub fn validate(&self) -> PortResult<()> {
        check_common(
            &self.email,
            &self.first_name,
            &self.last_name,
            self.phone.as_deref(),
        )
    }
}
