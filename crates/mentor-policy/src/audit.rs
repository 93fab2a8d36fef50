//! Settlement audit trail
//!
//! Records cancellation and modification decisions for the persistence layer.

use crate::eligibility::DenialKind;
use crate::engine::{ModificationDecision, SettlementResult};
use chrono::{DateTime, Utc};
use mentor_core::ENGINE_VERSION;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    Cancellation,
    Modification,
}

/// One recorded decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub booking_id: String,
    pub user_id: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Reason the caller gave for cancelling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stated_reason: Option<String>,
    #[serde(default)]
    pub refund_amount: f64,
    #[serde(default)]
    pub penalty_amount: f64,
    #[serde(default)]
    pub fee: f64,
    #[serde(default)]
    pub net_refund: f64,
    #[serde(default)]
    pub special_circumstances: bool,
    pub engine_version: String,
}

impl AuditEntry {
    /// Entry for a cancellation settlement
    pub fn from_settlement(settlement: &SettlementResult, user_id: impl Into<String>) -> Self {
        Self {
            id: generate_audit_id(),
            timestamp: settlement.evaluated_at,
            event_type: AuditEventType::Cancellation,
            booking_id: settlement.booking_id.clone(),
            user_id: user_id.into(),
            allowed: settlement.is_allowed,
            policy_id: settlement.policy.as_ref().map(|p| p.id.clone()),
            denial: settlement.denial,
            reason: settlement.reason.clone(),
            stated_reason: None,
            refund_amount: settlement
                .refund_calculation
                .as_ref()
                .map_or(0.0, |r| r.refund_amount),
            penalty_amount: settlement.penalty.as_ref().map_or(0.0, |p| p.amount),
            fee: settlement.processing_fee,
            net_refund: settlement.estimated_net_refund,
            special_circumstances: settlement.special_circumstances,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }

    /// Entry for a modification decision made at `at`
    pub fn from_modification(
        decision: &ModificationDecision,
        booking_id: impl Into<String>,
        user_id: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_audit_id(),
            timestamp: at,
            event_type: AuditEventType::Modification,
            booking_id: booking_id.into(),
            user_id: user_id.into(),
            allowed: decision.is_allowed,
            policy_id: None,
            denial: decision.denial,
            reason: decision.reason.clone(),
            stated_reason: None,
            refund_amount: 0.0,
            penalty_amount: 0.0,
            fee: decision.modification_fee.unwrap_or(0.0),
            net_refund: 0.0,
            special_circumstances: false,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }

    /// Attach the reason the caller gave
    pub fn with_stated_reason(mut self, reason: impl Into<String>) -> Self {
        self.stated_reason = Some(reason.into());
        self
    }
}

/// Bounded in-memory audit collector; oldest entries are dropped first
pub struct AuditLog {
    entries: Vec<AuditEntry>,
    max_entries: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_max_entries(10_000)
    }

    /// Log keeping at most `max` entries
    pub fn with_max_entries(max: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: max,
        }
    }

    /// Append an entry, evicting the oldest past capacity
    pub fn log(&mut self, entry: AuditEntry) {
        self.entries.push(entry);

        if self.entries.len() > self.max_entries {
            let drain_count = self.entries.len() - self.max_entries;
            self.entries.drain(0..drain_count);
        }
    }

    /// Record a settlement and return the entry id
    pub fn log_settlement(
        &mut self,
        settlement: &SettlementResult,
        user_id: &str,
        stated_reason: &str,
    ) -> String {
        let mut entry = AuditEntry::from_settlement(settlement, user_id);
        if !stated_reason.is_empty() {
            entry = entry.with_stated_reason(stated_reason);
        }
        let id = entry.id.clone();
        self.log(entry);
        id
    }

    /// All retained entries, oldest first
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Entries at or after `since`
    pub fn entries_since(&self, since: DateTime<Utc>) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| e.timestamp >= since).collect()
    }

    /// Entries for one booking
    pub fn entries_for_booking(&self, booking_id: &str) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| e.booking_id == booking_id).collect()
    }

    /// Entries for one user
    pub fn entries_for_user(&self, user_id: &str) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| e.user_id == user_id).collect()
    }

    /// Entries whose request was refused
    pub fn denied_entries(&self) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| !e.allowed).collect()
    }

    /// Entries settled under special circumstances
    pub fn special_circumstance_entries(&self) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| e.special_circumstances).collect()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Pretty-printed JSON array of the entries
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }

    /// One JSON object per line
    pub fn to_jsonl(&self) -> String {
        self.entries
            .iter()
            .filter_map(|e| serde_json::to_string(e).ok())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Aggregate counts over the retained entries
    pub fn stats(&self) -> AuditStats {
        let total = self.entries.len();
        let allowed = self.entries.iter().filter(|e| e.allowed).count();
        let special = self.entries.iter().filter(|e| e.special_circumstances).count();
        let total_net_refunded = self
            .entries
            .iter()
            .filter(|e| e.allowed && e.event_type == AuditEventType::Cancellation)
            .map(|e| e.net_refund)
            .sum();

        AuditStats {
            total,
            allowed,
            denied: total - allowed,
            special_circumstances: special,
            special_circumstance_rate: if total > 0 { special as f64 / total as f64 } else { 0.0 },
            total_net_refunded,
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStats {
    pub total: usize,
    pub allowed: usize,
    pub denied: usize,
    pub special_circumstances: usize,
    pub special_circumstance_rate: f64,
    pub total_net_refunded: f64,
}

fn generate_audit_id() -> String {
    format!("aud_{}", Uuid::new_v4().simple())
}
