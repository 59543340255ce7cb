use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItineraryError {
    /// Caller data broke a request constraint. Raised before any model call.
    #[error("{}", join_violations(.0))]
    InvalidInput(Vec<FieldViolation>),

    /// The completion provider failed, timed out, or produced nothing usable.
    #[error("AI generation failed: {0}")]
    GenerationFailure(String),
}

impl ItineraryError {
    pub fn generation(cause: impl Into<String>) -> Self {
        Self::GenerationFailure(cause.into())
    }

    pub fn invalid_fields(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidInput(violations) => violations.iter().map(|v| v.field).collect(),
            Self::GenerationFailure(_) => Vec::new(),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
