//! Refund, penalty and fee arithmetic
//!
//! All functions take the evaluation instant explicitly so one settlement
//! sees a single `now`.

use crate::catalog::{CancellationPolicy, RefundTier};
use chrono::{DateTime, Utc};
use mentor_core::{BookingRecord, CancellationRules};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundCalculation {
    pub original_amount: f64,
    pub refund_percent: f64,
    pub refund_amount: f64,
    pub applied_tier: RefundTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyType {
    #[default]
    None,
    LateCancellation,
    ShortNotice,
    FrequentCancellation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationPenalty {
    #[serde(rename = "type")]
    pub penalty_type: PenaltyType,
    pub percent: f64,
    pub amount: f64,
    pub description: String,
}

/// Refund for cancelling `booking` at `now` under `policy`.
///
/// The first tier, largest notice first, whose threshold is met applies. With no
/// match the policy's minimum refund applies. The percent always lands in
/// `[minimum_refund_percent, 100]`.
pub fn calculate_refund(
    booking: &BookingRecord,
    policy: &CancellationPolicy,
    now: DateTime<Utc>,
) -> RefundCalculation {
    let hours_until = booking.hours_until_start(now);
    let applied_tier = policy
        .tiers
        .iter()
        .find(|tier| hours_until >= tier.hours_before_session)
        .cloned()
        .unwrap_or_else(|| RefundTier::new(0.0, policy.minimum_refund_percent, "Minimum refund"));

    let refund_percent = applied_tier
        .refund_percent
        .max(policy.minimum_refund_percent)
        .min(100.0);

    RefundCalculation {
        original_amount: booking.amount,
        refund_percent,
        refund_amount: percent_of(booking.amount, refund_percent),
        applied_tier,
    }
}

/// Penalty for cancelling at `now` given the user's recent cancellation count
pub fn calculate_penalty(
    booking: &BookingRecord,
    policy: &CancellationPolicy,
    recent_cancellations: usize,
    now: DateTime<Utc>,
    rules: &CancellationRules,
) -> CancellationPenalty {
    let hours_until = booking.hours_until_start(now);

    let late = hours_until < rules.late_cancellation_hours;
    let (mut penalty_type, mut percent, mut description) = if late {
        (
            PenaltyType::LateCancellation,
            rules.late_cancellation_percent,
            format!(
                "Late cancellation (less than {}h notice) under {} policy",
                rules.late_cancellation_hours, policy.name
            ),
        )
    } else if hours_until < rules.short_notice_hours {
        (
            PenaltyType::ShortNotice,
            rules.short_notice_percent,
            format!(
                "Short notice cancellation (less than {}h notice) under {} policy",
                rules.short_notice_hours, policy.name
            ),
        )
    } else {
        (PenaltyType::None, 0.0, "No penalty".to_string())
    };

    if recent_cancellations >= rules.frequent_cancellation_threshold {
        penalty_type = PenaltyType::FrequentCancellation;
        percent += rules.frequent_cancellation_percent;
        description.push_str(&format!(
            "; frequent cancellations ({} in the last {} days)",
            recent_cancellations, rules.frequent_cancellation_lookback_days
        ));
    }

    CancellationPenalty {
        penalty_type,
        percent,
        amount: percent_of(booking.amount, percent),
        description,
    }
}

/// `max(minimum fee, amount * fee percent)`
pub fn processing_fee(amount: f64, rules: &CancellationRules) -> f64 {
    percent_of(amount, rules.processing_fee_percent).max(rules.minimum_processing_fee)
}

pub(crate) fn percent_of(amount: f64, percent: f64) -> f64 {
    round_cents(amount * percent / 100.0)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
