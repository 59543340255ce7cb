use serde::{Deserialize, Serialize};

use crate::error::{FieldViolation, ItineraryError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryRequest {
    pub city: String,
    pub days: i64,
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryResponse {
    pub text: String,
}

/// A request that passed validation. Only `city` is whitespace-normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedItinerary {
    pub city: String,
    pub days: i64,
    pub interests: Vec<String>,
}

impl ItineraryRequest {
    pub fn new(city: impl Into<String>, days: i64, interests: &[&str]) -> Self {
        Self {
            city: city.into(),
            days,
            interests: interests.iter().map(|value| value.to_string()).collect(),
        }
    }

    pub fn validate(&self) -> Result<ValidatedItinerary, ItineraryError> {
        let city = normalize_text(&self.city);

        let mut violations = Vec::new();
        if city.is_empty() {
            violations.push(FieldViolation::new("city", "must not be empty"));
        }
        if self.days < 1 {
            violations.push(FieldViolation::new(
                "days",
                format!("must be at least 1 (got {})", self.days),
            ));
        }
        if self.interests.is_empty() {
            violations.push(FieldViolation::new(
                "interests",
                "must contain at least one entry",
            ));
        }

        if !violations.is_empty() {
            return Err(ItineraryError::InvalidInput(violations));
        }

        Ok(ValidatedItinerary {
            city,
            days: self.days,
            interests: self.interests.clone(),
        })
    }
}

pub fn normalize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
