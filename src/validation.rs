//! Field validation shared by request payloads.
//!
//! Validators return the first failing field so the caller can surface a
//! single readable message before any work starts.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type ValidationResult = Result<(), ValidationError>;

pub fn require_non_blank(field: &str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("{} is required", field)));
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: f64) -> ValidationResult {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::new(format!("{} cannot be negative", field)));
    }
    Ok(())
}

/// Inclusive range check for floating point fields.
pub fn require_range(field: &str, value: f64, min: f64, max: f64) -> ValidationResult {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::new(format!(
            "{} must be between {} and {}",
            field, min, max
        )));
    }
    Ok(())
}
