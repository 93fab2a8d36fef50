//! Validation outcomes
//!
//! Rule failures accumulate into a [`ValidationResult`] instead of aborting the
//! caller. Each failure is a [`Violation`] tagged with the rule that raised it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single failed business rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Stable identifier of the rule (e.g. `lead_time`)
    pub rule_id: String,
    /// Human-readable message
    pub description: String,
    /// Ids of bookings involved in the failure
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub booking_ids: Vec<String>,
}

impl Violation {
    pub fn new(rule_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            description: description.into(),
            booking_ids: Vec::new(),
        }
    }

    /// Attach the ids of the bookings involved
    pub fn with_bookings(mut self, ids: Vec<String>) -> Self {
        self.booking_ids = ids;
        self
    }
}

/// Ordered, accumulated validation outcome. Valid iff no errors were recorded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<String>,
    violations: Vec<Violation>,
}

impl ValidationResult {
    /// Result with no violations
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// Record a violation
    pub fn push(&mut self, violation: Violation) {
        self.errors.push(violation.description.clone());
        self.violations.push(violation);
        self.is_valid = false;
    }

    /// Append every failure of `other`, keeping order
    pub fn merge(&mut self, other: ValidationResult) {
        for violation in other.violations {
            self.push(violation);
        }
    }

    /// True when nothing was recorded
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Human-readable descriptions, in recording order
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Recorded violations, in recording order
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether any violation carries `rule_id`
    pub fn has_rule(&self, rule_id: &str) -> bool {
        self.violations.iter().any(|v| v.rule_id == rule_id)
    }
}

impl FromIterator<Violation> for ValidationResult {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        let mut result = ValidationResult::valid();
        for violation in iter {
            result.push(violation);
        }
        result
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_valid {
            write!(f, "VALID")
        } else {
            write!(f, "INVALID: {}", self.errors.join("; "))
        }
    }
}
