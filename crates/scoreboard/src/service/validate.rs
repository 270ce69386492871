//! Input validation for score submissions.
//!
//! The same rules guard the service and the client's offline path, so a
//! submission that the server would reject is never applied locally.

use serde_json::Value;
use thiserror::Error;

/// A user-correctable problem with a submission. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    EmptyName,

    #[error("Count is required")]
    MissingCount,

    #[error("Count must be a positive integer, got {0}")]
    NonPositiveCount(i64),

    #[error("Count must be a positive integer, got {0}")]
    InvalidCount(String),

    /// The accumulated total for this name would exceed the largest count
    /// a store can hold.
    #[error("Total for '{0}' would exceed the maximum count")]
    TotalTooLarge(String),
}

/// A validated submission: trimmed non-empty name and positive count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    name: String,
    count: u64,
}

impl Submission {
    /// Validate a raw name and count.
    pub fn new(name: &str, count: i64) -> Result<Self, ValidationError> {
        let name = validate_name(name)?;
        let count = validate_count(count)?;
        Ok(Self {
            name: name.to_string(),
            count,
        })
    }

    /// Trimmed display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positive count.
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Reject empty or whitespace-only names, returning the trimmed name.
pub fn validate_name(name: &str) -> Result<&str, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed)
}

/// Reject zero and negative counts.
pub fn validate_count(count: i64) -> Result<u64, ValidationError> {
    u64::try_from(count)
        .ok()
        .filter(|c| *c > 0)
        .ok_or(ValidationError::NonPositiveCount(count))
}

/// Extract an integer count from a JSON request field.
///
/// Integral numbers are accepted in either spelling (`5` or `5.0`);
/// `1.5`, `"5"` and `true` are rejected.
pub fn count_from_json(value: Option<&Value>) -> Result<i64, ValidationError> {
    match value {
        None | Some(Value::Null) => Err(ValidationError::MissingCount),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(integral_f64))
            .ok_or_else(|| ValidationError::InvalidCount(n.to_string())),
        Some(other) => Err(ValidationError::InvalidCount(other.to_string())),
    }
}

/// `f` as an `i64` when it has no fractional part and fits.
fn integral_f64(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; everything below it fits in an i64
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.fract() == 0.0 && f >= -LIMIT && f < LIMIT).then_some(f as i64)
}
