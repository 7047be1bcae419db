use serde_json::{Map, Value};
use std::fmt;

use crate::domain::PaymentMethod;

pub const PAYMENT_REFERENCE_MAX_LEN: usize = 255;
pub const ADMIN_NOTES_MAX_LEN: usize = 1000;

/// A single field-keyed validation message. Batches of these travel inside
/// `ClientError::ValidationFailure` so the UI can attach each message to the
/// form field it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Strips non-whitespace control characters and collapses runs of whitespace
/// into single spaces.
pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control() || ch.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_positive_amount(amount: i64) -> ValidationResult {
    if amount <= 0 {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    Ok(())
}

/// Checks that `details` carries every field the chosen payment method
/// requires, each a non-empty string. All problems are collected so the form
/// can highlight every missing field at once.
pub fn validate_account_details(
    method: &PaymentMethod,
    details: &Map<String, Value>,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for field in method.required_fields() {
        match details.get(*field) {
            Some(Value::String(value)) => {
                if let Err(err) = validate_required(field, value) {
                    errors.push(err);
                }
            }
            Some(_) => errors.push(ValidationError::new(*field, "must be a string")),
            None => errors.push(ValidationError::new(*field, "is required")),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
