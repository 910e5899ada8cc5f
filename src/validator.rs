// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission validator.
//!
//! Turns a parsed JSON body into a typed submission or the first constraint
//! it violates. Checks run in a fixed order:
//! - body shape (must be an object)
//! - required field presence
//! - field types (strings only)
//! - email length and format
//! - subject and message length bounds

use crate::config::ValidationConfig;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

/// `<non-space>@<non-space>.<non-space>`, no `@` outside the separator.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// Validation error types. The display text is returned to the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid request body")]
    InvalidBody,

    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid input types")]
    InvalidTypes,

    #[error("Email too long")]
    EmailTooLong,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Subject too short")]
    SubjectTooShort,

    #[error("Subject too long")]
    SubjectTooLong,

    #[error("Message too short")]
    MessageTooShort,

    #[error("Message too long")]
    MessageTooLong,
}

/// A validated contact form submission. Fields are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub subject: String,
    pub message: String,
    pub from: String,
}

/// A validated subscribe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeSubmission {
    pub email: String,
}

/// Check an address against the simple `a@b.c` shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Validator for both submission shapes.
#[derive(Debug, Clone)]
pub struct SubmissionValidator {
    config: ValidationConfig,
}

impl SubmissionValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a `{subject, message, from}` body.
    pub fn validate_contact(&self, body: &Value) -> Result<ContactSubmission, ValidationError> {
        let fields = as_object(body)?;

        let raw = [
            field(fields, "subject"),
            field(fields, "message"),
            field(fields, "from"),
        ];
        if raw.iter().any(|v| is_missing(*v)) {
            debug!("Contact submission missing fields");
            return Err(ValidationError::MissingFields);
        }

        let [subject, message, from] = raw.map(|v| v.and_then(Value::as_str).map(str::trim));
        let (Some(subject), Some(message), Some(from)) = (subject, message, from) else {
            debug!("Contact submission has non-string fields");
            return Err(ValidationError::InvalidTypes);
        };

        self.check_email(from, self.config.contact_email_max_len)?;
        check_length(
            subject,
            self.config.subject_min_len,
            self.config.subject_max_len,
            ValidationError::SubjectTooShort,
            ValidationError::SubjectTooLong,
        )?;
        check_length(
            message,
            self.config.message_min_len,
            self.config.message_max_len,
            ValidationError::MessageTooShort,
            ValidationError::MessageTooLong,
        )?;

        Ok(ContactSubmission {
            subject: subject.to_string(),
            message: message.to_string(),
            from: from.to_string(),
        })
    }

    /// Validate an `{email}` body.
    pub fn validate_subscribe(&self, body: &Value) -> Result<SubscribeSubmission, ValidationError> {
        let fields = as_object(body)?;

        let raw = field(fields, "email");
        if is_missing(raw) {
            debug!("Subscribe request missing email");
            return Err(ValidationError::MissingFields);
        }

        let email = raw
            .and_then(Value::as_str)
            .map(str::trim)
            .ok_or(ValidationError::InvalidTypes)?;

        self.check_email(email, self.config.subscribe_email_max_len)?;

        Ok(SubscribeSubmission {
            email: email.to_string(),
        })
    }

    fn check_email(&self, email: &str, max_len: usize) -> Result<(), ValidationError> {
        if email.chars().count() > max_len {
            return Err(ValidationError::EmailTooLong);
        }
        if !is_valid_email(email) {
            debug!("Email format invalid");
            return Err(ValidationError::InvalidEmail);
        }
        Ok(())
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationError> {
    body.as_object().ok_or(ValidationError::InvalidBody)
}

fn field<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    fields.get(name)
}

/// Absent, null, and blank strings all count as missing.
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn check_length(
    value: &str,
    min: usize,
    max: usize,
    too_short: ValidationError,
    too_long: ValidationError,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        Err(too_short)
    } else if len > max {
        Err(too_long)
    } else {
        Ok(())
    }
}
