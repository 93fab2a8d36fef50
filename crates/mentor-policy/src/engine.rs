//! Cancellation policy engine
//!
//! ```text
//! lookup → eligibility gate → policy → refund + penalty + fee → settlement
//!                                                  ↑
//!                                     special-circumstance override
//! ```
//!
//! Collaborator failures never escape: they become denied outcomes with
//! [`DenialKind::StoreUnavailable`].

use crate::catalog::{CancellationPolicy, PolicyCatalog};
use crate::eligibility::{check_cancellation, check_modification, Denial, DenialKind};
use crate::settlement::{
    calculate_penalty, calculate_refund, percent_of, processing_fee, CancellationPenalty,
    RefundCalculation,
};
use crate::special_circumstances::matched_keyword;
use chrono::{DateTime, Days, NaiveTime, Utc};
use mentor_core::{
    BookingRecord, BookingStore, CancellationRules, Clock, EngineError, SchedulingRules,
    TimeInterval,
};
use mentor_schedule::TimeSlotValidator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of evaluating a cancellation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    pub booking_id: String,
    pub is_allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<CancellationPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_calculation: Option<RefundCalculation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalty: Option<CancellationPenalty>,
    pub processing_fee: f64,
    /// Refund minus penalty minus fee; negative when cancelling costs the caller
    pub estimated_net_refund: f64,
    pub special_circumstances: bool,
    pub evaluated_at: DateTime<Utc>,
}

impl SettlementResult {
    fn denied(booking_id: &str, denial: Denial, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            booking_id: booking_id.to_string(),
            is_allowed: false,
            reason: Some(denial.reason),
            denial: Some(denial.kind),
            policy: None,
            refund_calculation: None,
            penalty: None,
            processing_fee: 0.0,
            estimated_net_refund: 0.0,
            special_circumstances: false,
            evaluated_at,
        }
    }
}

/// Requested changes to an existing booking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Reschedule target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_interval: Option<TimeInterval>,
}

impl BookingUpdate {
    /// Update that only replaces the notes
    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            new_interval: None,
        }
    }

    /// Update that moves the session to `interval`
    pub fn reschedule(interval: TimeInterval) -> Self {
        Self {
            notes: None,
            new_interval: Some(interval),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationDecision {
    pub is_allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_fee: Option<f64>,
}

impl ModificationDecision {
    fn allowed(modification_fee: Option<f64>) -> Self {
        Self {
            is_allowed: true,
            reason: None,
            denial: None,
            modification_fee,
        }
    }

    fn denied(denial: Denial) -> Self {
        Self {
            is_allowed: false,
            reason: Some(denial.reason),
            denial: Some(denial.kind),
            modification_fee: None,
        }
    }
}

pub struct CancellationPolicyEngine {
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    rules: CancellationRules,
    catalog: PolicyCatalog,
    validator: TimeSlotValidator,
}

impl CancellationPolicyEngine {
    pub fn new(store: Arc<dyn BookingStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            validator: TimeSlotValidator::new(SchedulingRules::default(), clock.clone()),
            store,
            clock,
            rules: CancellationRules::default(),
            catalog: PolicyCatalog::default(),
        }
    }

    /// Replace the cancellation rules
    pub fn with_rules(mut self, rules: CancellationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the policy catalog
    pub fn with_catalog(mut self, catalog: PolicyCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Rules used when validating reschedules
    pub fn with_scheduling_rules(mut self, rules: SchedulingRules) -> Self {
        self.validator = TimeSlotValidator::new(rules, self.clock.clone());
        self
    }

    /// Active cancellation rules
    pub fn rules(&self) -> &CancellationRules {
        &self.rules
    }

    /// Active policy catalog
    pub fn catalog(&self) -> &PolicyCatalog {
        &self.catalog
    }

    /// Processing fee charged on a cancellation of `amount`
    pub fn processing_fee(&self, amount: f64) -> f64 {
        processing_fee(amount, &self.rules)
    }

    /// Whether `user_id` may cancel `booking` right now
    pub fn can_cancel(&self, booking: &BookingRecord, user_id: &str) -> bool {
        check_cancellation(booking, user_id, self.clock.now(), &self.rules).is_ok()
    }

    /// Evaluate `user_id` cancelling `booking_id` for `reason`
    pub fn evaluate(&self, booking_id: &str, user_id: &str, reason: &str) -> SettlementResult {
        let now = self.clock.now();

        let booking = match self.load_booking(booking_id) {
            Ok(booking) => booking,
            Err(denial) => return SettlementResult::denied(booking_id, denial, now),
        };
        if let Err(denial) = check_cancellation(&booking, user_id, now, &self.rules) {
            tracing::info!(
                booking_id,
                user_id,
                kind = %denial.kind,
                reason = %denial.reason,
                "cancellation denied"
            );
            return SettlementResult::denied(booking_id, denial, now);
        }

        let recent = match self.store.cancellations_since(user_id, now - self.rules.lookback()) {
            Ok(count) => count,
            Err(err) => return SettlementResult::denied(booking_id, store_denial(&err), now),
        };

        let policy = self.catalog.policy_for_booking(&booking);
        let refund = calculate_refund(&booking, &policy, now);
        let penalty = calculate_penalty(&booking, &policy, recent, now, &self.rules);
        let fee = processing_fee(booking.amount, &self.rules);
        let mut net = refund.refund_amount - penalty.amount - fee;

        let keyword = matched_keyword(reason);
        if let Some(keyword) = keyword {
            tracing::info!(booking_id, keyword, "special circumstances grant a full refund");
            net = booking.amount;
        }

        tracing::info!(
            booking_id,
            policy = %policy.id,
            refund = refund.refund_amount,
            penalty = penalty.amount,
            fee,
            net,
            "cancellation settled"
        );

        SettlementResult {
            booking_id: booking_id.to_string(),
            is_allowed: true,
            reason: None,
            denial: None,
            policy: Some(policy),
            refund_calculation: Some(refund),
            penalty: Some(penalty),
            processing_fee: fee,
            estimated_net_refund: net,
            special_circumstances: keyword.is_some(),
            evaluated_at: now,
        }
    }

    /// Check whether `user_id` may apply `update` to `booking_id`.
    ///
    /// A reschedule is validated against the mentor's other bookings on the
    /// target days. Inside the fee window the decision carries a modification fee.
    pub fn validate_modification(
        &self,
        booking_id: &str,
        user_id: &str,
        update: &BookingUpdate,
    ) -> ModificationDecision {
        let now = self.clock.now();

        let booking = match self.load_booking(booking_id) {
            Ok(booking) => booking,
            Err(denial) => return ModificationDecision::denied(denial),
        };
        if let Err(denial) = check_modification(&booking, user_id, now, &self.rules) {
            tracing::info!(booking_id, user_id, kind = %denial.kind, "modification denied");
            return ModificationDecision::denied(denial);
        }

        if let Some(notes) = &update.notes {
            if notes.chars().count() > self.rules.max_notes_chars {
                return ModificationDecision::denied(Denial::new(
                    DenialKind::Invalid,
                    format!("Notes cannot exceed {} characters", self.rules.max_notes_chars),
                ));
            }
        }

        if let Some(target) = &update.new_interval {
            if let Err(denial) = self.check_reschedule(&booking, target, now) {
                return ModificationDecision::denied(denial);
            }
        }

        let fee = (booking.hours_until_start(now) < self.rules.modification_fee_window_hours)
            .then(|| percent_of(booking.amount, self.rules.modification_fee_percent));
        tracing::debug!(booking_id, ?fee, "modification allowed");
        ModificationDecision::allowed(fee)
    }

    fn check_reschedule(
        &self,
        booking: &BookingRecord,
        target: &TimeInterval,
        now: DateTime<Utc>,
    ) -> Result<(), Denial> {
        let day_start = target.start_date().and_time(NaiveTime::MIN).and_utc();
        let day_end = target
            .end_date()
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .unwrap_or(target.end());
        let range = TimeInterval::new(day_start, day_end).unwrap_or(*target);

        let existing = self
            .store
            .mentor_bookings(&booking.mentor_id, Some(&range))
            .map_err(|err| store_denial(&err))?;

        let result = self
            .validator
            .validate_at(&booking.mentor_id, target, &existing, Some(&booking.id), now);
        if result.is_valid() {
            Ok(())
        } else {
            Err(Denial::new(DenialKind::Invalid, result.errors().join("; ")))
        }
    }

    fn load_booking(&self, booking_id: &str) -> Result<BookingRecord, Denial> {
        match self.store.booking(booking_id) {
            Ok(Some(booking)) => Ok(booking),
            Ok(None) => Err(Denial::new(
                DenialKind::NotFound,
                EngineError::not_found("booking", booking_id).to_string(),
            )),
            Err(err) => Err(store_denial(&err)),
        }
    }
}

fn store_denial(err: &EngineError) -> Denial {
    tracing::warn!(error = %err, "booking store call failed");
    Denial::new(DenialKind::StoreUnavailable, format!("Booking data unavailable: {err}"))
}
