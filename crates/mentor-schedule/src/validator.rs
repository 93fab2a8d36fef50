//! Time slot validation
//!
//! Applies the booking-window rules to a candidate interval. Every applicable
//! rule is checked and all failures are reported together.

use crate::availability::AvailabilityCalculator;
use crate::conflict::ConflictDetector;
use chrono::{DateTime, Days, NaiveTime, Utc};
use mentor_core::{
    BookingRecord, BookingStore, Clock, SchedulingRules, SystemClock, TimeInterval,
    ValidationResult,
    Violation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Rule identifiers carried by [`Violation::rule_id`]
pub mod rules {
    pub const INTERVAL_ORDER: &str = "interval_order";
    pub const LEAD_TIME: &str = "lead_time";
    pub const CONFLICT: &str = "conflict";
    pub const BUSINESS_HOURS: &str = "business_hours";
    pub const SAME_DAY: &str = "same_day";
    pub const DURATION: &str = "duration";
    pub const AMOUNT: &str = "amount";
    pub const CURRENCY: &str = "currency";
    pub const SESSION_NOT_FOUND: &str = "session_not_found";
    pub const USER_NOT_FOUND: &str = "user_not_found";
    pub const DUPLICATE_BOOKING: &str = "duplicate_booking";
    pub const AVAILABILITY: &str = "availability";
    pub const STORE: &str = "store_unavailable";
}

/// A request to book a mentor's session, as received from the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub mentor_id: String,
    pub user_id: String,
    pub session_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub amount: f64,
    pub currency: String,
}

pub struct TimeSlotValidator {
    rules: SchedulingRules,
    clock: Arc<dyn Clock>,
    detector: ConflictDetector,
    availability: AvailabilityCalculator,
}

impl Default for TimeSlotValidator {
    fn default() -> Self {
        Self::new(SchedulingRules::default(), Arc::new(SystemClock))
    }
}

impl TimeSlotValidator {
    /// Validator using `rules` and `clock`
    pub fn new(rules: SchedulingRules, clock: Arc<dyn Clock>) -> Self {
        Self {
            availability: AvailabilityCalculator::new(rules.clone()),
            detector: ConflictDetector::new(),
            rules,
            clock,
        }
    }

    /// Active scheduling rules
    pub fn rules(&self) -> &SchedulingRules {
        &self.rules
    }

    /// Validate raw start/end times. An inverted range is the only error reported
    /// because nothing else can be checked.
    pub fn validate_times(
        &self,
        mentor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        existing: &[BookingRecord],
        exclude_id: Option<&str>,
    ) -> ValidationResult {
        match TimeInterval::new(start, end) {
            Ok(candidate) => self.validate(mentor_id, &candidate, existing, exclude_id),
            Err(_) => interval_order_failure(),
        }
    }

    /// Lead time, conflicts, business hours and same-day rules, in that order
    pub fn validate(
        &self,
        mentor_id: &str,
        candidate: &TimeInterval,
        existing: &[BookingRecord],
        exclude_id: Option<&str>,
    ) -> ValidationResult {
        let now = self.clock.now();
        self.validate_at(mentor_id, candidate, existing, exclude_id, now)
    }

    /// [`Self::validate`] evaluated at `now`, for callers that already sampled the clock
    pub fn validate_at(
        &self,
        mentor_id: &str,
        candidate: &TimeInterval,
        existing: &[BookingRecord],
        exclude_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> ValidationResult {
        let mut result = ValidationResult::valid();

        if candidate.start() <= now + self.rules.lead_time() {
            result.push(Violation::new(
                rules::LEAD_TIME,
                format!(
                    "Booking must start at least {} minutes from now",
                    self.rules.lead_time_minutes
                ),
            ));
        }

        let conflicts = self.detector.detect(mentor_id, candidate, existing, exclude_id);
        if conflicts.has_conflicts {
            let ids = conflicts.booking_ids();
            result.push(
                Violation::new(
                    rules::CONFLICT,
                    format!("Time slot conflicts with existing booking(s): {}", ids.join(", ")),
                )
                .with_bookings(ids),
            );
        }

        if let Some(message) = self.business_hours_failure(candidate) {
            result.push(Violation::new(rules::BUSINESS_HOURS, message));
        }

        if candidate.start_date() != candidate.end_date() {
            result.push(Violation::new(
                rules::SAME_DAY,
                "Booking must start and end on the same day",
            ));
        }

        if !result.is_valid() {
            tracing::debug!(
                mentor_id,
                candidate = %candidate,
                errors = ?result.errors(),
                "time slot rejected"
            );
        }
        result
    }

    /// Session starts in `[open, close)` and ends in `(open, close]` on a business day
    fn business_hours_failure(&self, candidate: &TimeInterval) -> Option<String> {
        let start_date = candidate.start_date();
        let end_date = candidate.end_date();
        if !self.rules.is_business_day(start_date) || !self.rules.is_business_day(end_date) {
            return Some(
                "Bookings are only available on business days (Monday to Friday)".to_string(),
            );
        }

        let (open, close) = self.rules.business_window(start_date);
        let (end_open, end_close) = self.rules.business_window(end_date);
        let start_ok = candidate.start() >= open && candidate.start() < close;
        let end_ok = candidate.end() > end_open && candidate.end() <= end_close;
        if start_ok && end_ok {
            None
        } else {
            Some(format!(
                "Bookings must be between {:02}:00 and {:02}:00 UTC",
                self.rules.business_open_hour, self.rules.business_close_hour
            ))
        }
    }

    /// Full pre-creation check of a booking request.
    ///
    /// Adds directory lookups, duration, amount and duplicate checks to the time
    /// slot rules, then checks the mentor's capacity for the booked day.
    pub fn validate_booking_request(
        &self,
        request: &BookingRequest,
        store: &dyn BookingStore,
    ) -> ValidationResult {
        let now = self.clock.now();
        let mut result = ValidationResult::valid();

        match store.session_exists(&request.session_id) {
            Ok(true) => {}
            Ok(false) => result.push(Violation::new(
                rules::SESSION_NOT_FOUND,
                format!("Session {} not found", request.session_id),
            )),
            Err(err) => result.push(store_failure(&err)),
        }
        match store.user_exists(&request.user_id) {
            Ok(true) => {}
            Ok(false) => result.push(Violation::new(
                rules::USER_NOT_FOUND,
                format!("User {} not found", request.user_id),
            )),
            Err(err) => result.push(store_failure(&err)),
        }

        let candidate = TimeInterval::new(request.start, request.end).ok();
        match &candidate {
            Some(interval) => {
                let minutes = interval.duration_minutes();
                if minutes < self.rules.min_duration_minutes
                    || minutes > self.rules.max_duration_minutes
                {
                    result.push(Violation::new(
                        rules::DURATION,
                        format!(
                            "Session duration must be between {} and {} minutes",
                            self.rules.min_duration_minutes, self.rules.max_duration_minutes
                        ),
                    ));
                }
            }
            None => result.merge(interval_order_failure()),
        }

        if !(request.amount > 0.0) {
            result.push(Violation::new(rules::AMOUNT, "Amount must be greater than zero"));
        }
        if request.currency.trim().is_empty() {
            result.push(Violation::new(rules::CURRENCY, "Currency is required"));
        }

        match store.has_active_booking(&request.user_id, &request.session_id) {
            Ok(false) => {}
            Ok(true) => result.push(Violation::new(
                rules::DUPLICATE_BOOKING,
                "User already has an active booking for this session",
            )),
            Err(err) => result.push(store_failure(&err)),
        }

        let Some(candidate) = candidate else {
            return result;
        };

        let day_start = candidate.start_date().and_time(NaiveTime::MIN).and_utc();
        let day_end = candidate
            .end_date()
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            .unwrap_or(candidate.end());
        let lookup = TimeInterval::new(day_start, day_end).unwrap_or(candidate);

        let existing = match store.mentor_bookings(&request.mentor_id, Some(&lookup)) {
            Ok(bookings) => bookings,
            Err(err) => {
                result.push(store_failure(&err));
                return result;
            }
        };

        result.merge(self.validate_at(&request.mentor_id, &candidate, &existing, None, now));

        let report = self.availability.availability(
            &request.mentor_id,
            candidate.start_date(),
            candidate.end_date(),
            &existing,
        );
        if let Some(reason) = report.reason {
            result.push(Violation::new(rules::AVAILABILITY, reason));
        }

        tracing::debug!(
            mentor_id = %request.mentor_id,
            user_id = %request.user_id,
            valid = result.is_valid(),
            "booking request validated"
        );
        result
    }
}

fn interval_order_failure() -> ValidationResult {
    vec![Violation::new(rules::INTERVAL_ORDER, "Start time must precede end time")]
        .into_iter()
        .collect()
}

fn store_failure(err: &mentor_core::EngineError) -> Violation {
    tracing::warn!(error = %err, "booking store lookup failed during validation");
    Violation::new(rules::STORE, format!("Unable to verify booking data: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use mentor_core::{FixedClock, InMemoryBookingStore};

    // Monday 2026-03-09 08:00 UTC
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0).unwrap()
    }

    fn span(day: u32, hour: u32, minute: u32, minutes: i64) -> TimeInterval {
        TimeInterval::starting_at(at(day, hour, minute), Duration::minutes(minutes)).unwrap()
    }

    fn validator() -> TimeSlotValidator {
        TimeSlotValidator::new(SchedulingRules::default(), Arc::new(FixedClock::new(now())))
    }

    fn confirmed(id: &str, interval: TimeInterval) -> BookingRecord {
        BookingRecord::new(id, "mentor-1", "user-9", interval, now() - Duration::days(1))
    }

    #[test]
    fn test_valid_slot() {
        let result = validator().validate("mentor-1", &span(10, 10, 0, 60), &[], None);
        assert!(result.is_valid(), "{result}");
    }

    #[test]
    fn test_inverted_times_short_circuit() {
        let result =
            validator().validate_times("mentor-1", at(10, 11, 0), at(10, 10, 0), &[], None);
        assert_eq!(result.errors(), ["Start time must precede end time".to_string()]);
    }

    #[test]
    fn test_lead_time() {
        let soon =
            TimeInterval::starting_at(now() + Duration::minutes(5), Duration::minutes(30)).unwrap();
        let result = validator().validate("mentor-1", &soon, &[], None);
        assert!(result.has_rule(rules::LEAD_TIME));

        let exactly =
            TimeInterval::starting_at(now() + Duration::minutes(15), Duration::minutes(30))
                .unwrap();
        assert!(validator().validate("mentor-1", &exactly, &[], None).has_rule(rules::LEAD_TIME));
    }

    #[test]
    fn test_conflict_names_booking_ids() {
        let existing = vec![confirmed("b-7", span(10, 14, 0, 60))];
        let result = validator().validate("mentor-1", &span(10, 14, 30, 60), &existing, None);
        assert!(result.has_rule(rules::CONFLICT));
        assert!(result.errors()[0].contains("b-7"));

        let result = validator().validate("mentor-1", &span(10, 15, 0, 60), &existing, None);
        assert!(result.is_valid());

        let result =
            validator().validate("mentor-1", &span(10, 14, 30, 60), &existing, Some("b-7"));
        assert!(result.is_valid());
    }

    #[test]
    fn test_weekend_and_hours() {
        let saturday = span(14, 10, 0, 60);
        let result = validator().validate("mentor-1", &saturday, &[], None);
        assert!(result.has_rule(rules::BUSINESS_HOURS));

        let early = span(10, 8, 30, 60);
        let result = validator().validate("mentor-1", &early, &[], None);
        assert!(result.has_rule(rules::BUSINESS_HOURS));

        let late = span(10, 20, 30, 60);
        assert!(validator().validate("mentor-1", &late, &[], None).has_rule(rules::BUSINESS_HOURS));

        let last_slot = span(10, 20, 0, 60);
        assert!(validator().validate("mentor-1", &last_slot, &[], None).is_valid());
    }

    #[test]
    fn test_session_may_end_exactly_at_close() {
        let validator = validator();
        let at_close = span(10, 20, 30, 30);
        assert!(validator.validate("mentor-1", &at_close, &[], None).is_valid());

        let past_close = span(10, 20, 30, 31);
        let result = validator.validate("mentor-1", &past_close, &[], None);
        assert!(result.has_rule(rules::BUSINESS_HOURS));
        assert_eq!(result.errors().len(), 1);
    }

    #[test]
    fn test_errors_accumulate() {
        let clock = Arc::new(FixedClock::new(at(14, 9, 55)));
        let validator = TimeSlotValidator::new(SchedulingRules::default(), clock);
        // Saturday, five minutes out
        let result = validator.validate("mentor-1", &span(14, 10, 0, 60), &[], None);
        assert!(result.has_rule(rules::LEAD_TIME));
        assert!(result.has_rule(rules::BUSINESS_HOURS));
        assert_eq!(result.errors().len(), 2);
    }

    #[test]
    fn test_overnight_fails_same_day() {
        let overnight = TimeInterval::new(at(10, 20, 0), at(11, 9, 30)).unwrap();
        let result = validator().validate("mentor-1", &overnight, &[], None);
        // each endpoint sits inside its own day's window
        assert!(result.has_rule(rules::SAME_DAY));
        assert!(!result.has_rule(rules::BUSINESS_HOURS));
    }

    fn request(start: DateTime<Utc>, minutes: i64) -> BookingRequest {
        BookingRequest {
            mentor_id: "mentor-1".to_string(),
            user_id: "user-1".to_string(),
            session_id: "session-1".to_string(),
            start,
            end: start + Duration::minutes(minutes),
            amount: 80.0,
            currency: "USD".to_string(),
        }
    }

    fn store() -> InMemoryBookingStore {
        InMemoryBookingStore::new().with_user("user-1").with_session("session-1")
    }

    #[test]
    fn test_booking_request_valid() {
        let result = validator().validate_booking_request(&request(at(10, 10, 0), 60), &store());
        assert!(result.is_valid(), "{result}");
    }

    #[test]
    fn test_booking_request_accumulates_field_errors() {
        let mut req = request(at(10, 10, 0), 10);
        req.amount = 0.0;
        req.currency = " ".to_string();
        req.session_id = "missing".to_string();

        let result = validator().validate_booking_request(&req, &store());
        assert!(result.has_rule(rules::SESSION_NOT_FOUND));
        assert!(result.has_rule(rules::DURATION));
        assert!(result.has_rule(rules::AMOUNT));
        assert!(result.has_rule(rules::CURRENCY));
        assert_eq!(result.errors().len(), 4);
    }

    #[test]
    fn test_booking_request_duplicate_and_conflict() {
        let existing = confirmed("b-1", span(10, 10, 30, 60)).with_session("session-1");
        let mut mine = confirmed("b-2", span(11, 10, 0, 60)).with_session("session-1");
        mine.user_id = "user-1".to_string();
        let store = store().with_booking(existing).with_booking(mine);

        let result = validator().validate_booking_request(&request(at(10, 10, 0), 60), &store);
        assert!(result.has_rule(rules::DUPLICATE_BOOKING));
        assert!(result.has_rule(rules::CONFLICT));
    }

    #[test]
    fn test_booking_request_over_capacity() {
        let store = store();
        for i in 0..8u32 {
            store.insert(confirmed(&format!("b-{i}"), span(12, 9 + i, 0, 30)));
        }
        let result = validator().validate_booking_request(&request(at(12, 18, 0), 60), &store);
        assert!(result.has_rule(rules::AVAILABILITY));
        assert!(!result.has_rule(rules::CONFLICT));
    }

    #[test]
    fn test_booking_request_store_failure_is_reported() {
        let store = store();
        store.set_unavailable(true);
        let result = validator().validate_booking_request(&request(at(10, 10, 0), 60), &store);
        assert!(!result.is_valid());
        assert!(result.has_rule(rules::STORE));
    }
}
