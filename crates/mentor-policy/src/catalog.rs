//! Cancellation policy catalog
//!
//! Policies differ only by parameters, so they are plain data. The three
//! built-in presets can be replaced by a catalog loaded from YAML.

use mentor_core::{BookingRecord, EngineError, Result};
use serde::{Deserialize, Serialize};

pub const STANDARD: &str = "standard";
pub const FLEXIBLE: &str = "flexible";
pub const STRICT: &str = "strict";

/// Refund bracket keyed by minimum notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundTier {
    /// Applies when at least this many hours remain before the session
    pub hours_before_session: f64,
    pub refund_percent: f64,
    #[serde(default)]
    pub description: String,
}

impl RefundTier {
    pub fn new(
        hours_before_session: f64,
        refund_percent: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            hours_before_session,
            refund_percent,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationPolicy {
    pub id: String,
    pub name: String,
    /// Floor applied when no tier matches
    pub minimum_refund_percent: f64,
    /// Informational; settlement fees come from `CancellationRules`
    pub processing_fee_percent: f64,
    /// Sorted by `hours_before_session`, largest first
    pub tiers: Vec<RefundTier>,
}

impl CancellationPolicy {
    pub fn standard() -> Self {
        Self {
            id: STANDARD.to_string(),
            name: "Standard".to_string(),
            minimum_refund_percent: 25.0,
            processing_fee_percent: 5.0,
            tiers: vec![
                RefundTier::new(168.0, 100.0, "Full refund (7+ days notice)"),
                RefundTier::new(72.0, 75.0, "75% refund (3-7 days notice)"),
                RefundTier::new(24.0, 50.0, "50% refund (1-3 days notice)"),
                RefundTier::new(2.0, 25.0, "25% refund (2-24 hours notice)"),
            ],
        }
    }

    pub fn flexible() -> Self {
        Self {
            id: FLEXIBLE.to_string(),
            name: "Flexible".to_string(),
            minimum_refund_percent: 50.0,
            processing_fee_percent: 3.0,
            tiers: vec![
                RefundTier::new(96.0, 100.0, "Full refund (4+ days notice)"),
                RefundTier::new(48.0, 90.0, "90% refund (2-4 days notice)"),
                RefundTier::new(24.0, 75.0, "75% refund (1-2 days notice)"),
                RefundTier::new(4.0, 50.0, "50% refund (4-24 hours notice)"),
            ],
        }
    }

    pub fn strict() -> Self {
        Self {
            id: STRICT.to_string(),
            name: "Strict".to_string(),
            minimum_refund_percent: 10.0,
            processing_fee_percent: 10.0,
            tiers: vec![
                RefundTier::new(168.0, 75.0, "75% refund (7+ days notice)"),
                RefundTier::new(96.0, 50.0, "50% refund (4-7 days notice)"),
                RefundTier::new(48.0, 25.0, "25% refund (2-4 days notice)"),
                RefundTier::new(24.0, 10.0, "10% refund (1-2 days notice)"),
            ],
        }
    }

    fn sort_tiers(&mut self) {
        self.tiers
            .sort_by(|a, b| b.hours_before_session.total_cmp(&a.hours_before_session));
    }

    fn validate(&self) -> Result<()> {
        let in_range = |p: f64| (0.0..=100.0).contains(&p);
        if !in_range(self.minimum_refund_percent) {
            return Err(EngineError::Config(format!(
                "policy {}: minimum refund percent {} outside 0-100",
                self.id, self.minimum_refund_percent
            )));
        }
        if let Some(tier) = self.tiers.iter().find(|t| !in_range(t.refund_percent)) {
            return Err(EngineError::Config(format!(
                "policy {}: tier at {}h refunds {} percent",
                self.id, tier.hours_before_session, tier.refund_percent
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCatalog {
    policies: Vec<CancellationPolicy>,
    #[serde(default = "default_policy_id")]
    default_policy: String,
}

fn default_policy_id() -> String {
    STANDARD.to_string()
}

impl Default for PolicyCatalog {
    fn default() -> Self {
        Self {
            policies: vec![
                CancellationPolicy::standard(),
                CancellationPolicy::flexible(),
                CancellationPolicy::strict(),
            ],
            default_policy: default_policy_id(),
        }
    }
}

impl PolicyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from YAML; tiers are re-sorted largest notice first
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut catalog: Self = serde_yaml::from_str(yaml)?;
        for policy in &mut catalog.policies {
            policy.validate()?;
            policy.sort_tiers();
        }
        if catalog.get(&catalog.default_policy).is_none() {
            return Err(EngineError::Config(format!(
                "default policy {} is not defined",
                catalog.default_policy
            )));
        }
        Ok(catalog)
    }

    /// Policy by id
    pub fn get(&self, id: &str) -> Option<&CancellationPolicy> {
        self.policies.iter().find(|p| p.id == id)
    }

    /// All policies in catalog order
    pub fn policies(&self) -> &[CancellationPolicy] {
        &self.policies
    }

    /// Policy governing `booking`.
    ///
    /// Every booking currently gets the default policy. Session-type or
    /// subscription based selection plugs in here.
    pub fn policy_for_booking(&self, _booking: &BookingRecord) -> CancellationPolicy {
        self.get(&self.default_policy)
            .cloned()
            .unwrap_or_else(CancellationPolicy::standard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use mentor_core::TimeInterval;

    #[test]
    fn test_presets() {
        let catalog = PolicyCatalog::new();
        let standard = catalog.get(STANDARD).unwrap();
        assert_eq!(standard.minimum_refund_percent, 25.0);
        assert_eq!(standard.tiers.len(), 4);

        assert_eq!(catalog.get(FLEXIBLE).unwrap().tiers[1].refund_percent, 90.0);
        assert_eq!(catalog.get(STRICT).unwrap().processing_fee_percent, 10.0);
        assert!(catalog.get("lenient").is_none());
    }

    #[test]
    fn test_presets_are_sorted_descending() {
        for policy in PolicyCatalog::new().policies() {
            assert!(policy
                .tiers
                .windows(2)
                .all(|w| w[0].hours_before_session > w[1].hours_before_session));
        }
    }

    #[test]
    fn test_policy_for_booking_is_standard() {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 10, 0, 0).unwrap();
        let interval = TimeInterval::starting_at(start, Duration::hours(1)).unwrap();
        let booking = BookingRecord::new("b-1", "m-1", "u-1", interval, start);
        assert_eq!(PolicyCatalog::new().policy_for_booking(&booking).id, STANDARD);
    }

    #[test]
    fn test_from_yaml_sorts_tiers() {
        let yaml = r#"
policies:
  - id: weekend
    name: Weekend
    minimumRefundPercent: 20
    processingFeePercent: 4
    tiers:
      - { hoursBeforeSession: 12, refundPercent: 40 }
      - { hoursBeforeSession: 48, refundPercent: 100, description: "two days" }
defaultPolicy: weekend
"#;
        let catalog = PolicyCatalog::from_yaml(yaml).unwrap();
        let policy = catalog.get("weekend").unwrap();
        assert_eq!(policy.tiers[0].hours_before_session, 48.0);
        assert_eq!(policy.tiers[1].description, "");
    }

    #[test]
    fn test_from_yaml_rejects_bad_catalogs() {
        let missing_default = "policies: []\n";
        assert!(matches!(PolicyCatalog::from_yaml(missing_default), Err(EngineError::Config(_))));

        let bad_percent = r#"
policies:
  - { id: standard, name: S, minimumRefundPercent: 120, processingFeePercent: 1, tiers: [] }
"#;
        assert!(matches!(PolicyCatalog::from_yaml(bad_percent), Err(EngineError::Config(_))));
    }
}
