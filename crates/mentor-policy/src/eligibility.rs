//! Authorization and eligibility gates shared by cancellation and modification

use chrono::{DateTime, Duration, Utc};
use mentor_core::{BookingRecord, BookingStatus, CancellationRules};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a request was refused, for mapping onto transport-level signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NotFound,
    Unauthorized,
    Ineligible,
    Invalid,
    StoreUnavailable,
}

impl fmt::Display for DenialKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DenialKind::NotFound => "not_found",
            DenialKind::Unauthorized => "unauthorized",
            DenialKind::Ineligible => "ineligible",
            DenialKind::Invalid => "invalid",
            DenialKind::StoreUnavailable => "store_unavailable",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub kind: DenialKind,
    pub reason: String,
}

impl Denial {
    pub fn new(kind: DenialKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Caller is a party to the booking and the booking is still open
fn check_open_booking(booking: &BookingRecord, user_id: &str, action: &str) -> Result<(), Denial> {
    if !booking.involves(user_id) {
        return Err(Denial::new(
            DenialKind::Unauthorized,
            format!("Not authorized to {action} this booking"),
        ));
    }
    match booking.status {
        BookingStatus::Cancelled | BookingStatus::Completed => Err(Denial::new(
            DenialKind::Ineligible,
            format!("Booking is already {}", booking.status),
        )),
        _ => Ok(()),
    }
}

fn check_cutoff(
    booking: &BookingRecord,
    now: DateTime<Utc>,
    cutoff: Duration,
    action: &str,
) -> Result<(), Denial> {
    if now < booking.start() - cutoff {
        Ok(())
    } else {
        Err(Denial::new(
            DenialKind::Ineligible,
            format!(
                "{action} must be made at least {} minutes before the session",
                cutoff.num_minutes()
            ),
        ))
    }
}

/// Cancellation gate, see [`can_cancel`]
pub fn check_cancellation(
    booking: &BookingRecord,
    user_id: &str,
    now: DateTime<Utc>,
    rules: &CancellationRules,
) -> Result<(), Denial> {
    check_open_booking(booking, user_id, "cancel")?;
    check_cutoff(booking, now, rules.cancellation_cutoff(), "Cancellations")?;

    let window = Duration::hours(rules.unpaid_cancellation_window_hours);
    if !booking.is_paid() && booking.created_at < now - window {
        return Err(Denial::new(
            DenialKind::Ineligible,
            format!(
                "Unpaid bookings can only be cancelled within {} hours of creation",
                rules.unpaid_cancellation_window_hours
            ),
        ));
    }
    Ok(())
}

/// Whether `user_id` may cancel `booking` at `now`
pub fn can_cancel(
    booking: &BookingRecord,
    user_id: &str,
    now: DateTime<Utc>,
    rules: &CancellationRules,
) -> bool {
    check_cancellation(booking, user_id, now, rules).is_ok()
}

/// Modification gate: same parties and statuses as cancellation, longer cutoff
pub fn check_modification(
    booking: &BookingRecord,
    user_id: &str,
    now: DateTime<Utc>,
    rules: &CancellationRules,
) -> Result<(), Denial> {
    check_open_booking(booking, user_id, "modify")?;
    check_cutoff(booking, now, rules.modification_cutoff(), "Modifications")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mentor_core::TimeInterval;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap()
    }

    fn booking_in(minutes: i64) -> BookingRecord {
        let interval =
            TimeInterval::starting_at(now() + Duration::minutes(minutes), Duration::hours(1))
                .unwrap();
        BookingRecord::new("b-1", "mentor-1", "user-1", interval, now() - Duration::days(3))
    }

    #[test]
    fn test_parties_may_cancel() {
        let rules = CancellationRules::default();
        assert!(can_cancel(&booking_in(120), "user-1", now(), &rules));
        assert!(can_cancel(&booking_in(120), "mentor-1", now(), &rules));

        let denial = check_cancellation(&booking_in(120), "intruder", now(), &rules).unwrap_err();
        assert_eq!(denial.kind, DenialKind::Unauthorized);
    }

    #[test]
    fn test_closed_bookings_cannot_be_cancelled() {
        let rules = CancellationRules::default();
        for status in [BookingStatus::Cancelled, BookingStatus::Completed] {
            let closed = booking_in(120).with_status(status);
            let denial = check_cancellation(&closed, "user-1", now(), &rules).unwrap_err();
            assert_eq!(denial.kind, DenialKind::Ineligible);
        }
        let no_show = booking_in(120).with_status(BookingStatus::NoShow);
        assert!(can_cancel(&no_show, "user-1", now(), &rules));
    }

    #[test]
    fn test_cancellation_cutoff() {
        let rules = CancellationRules::default();
        assert!(can_cancel(&booking_in(31), "user-1", now(), &rules));
        assert!(!can_cancel(&booking_in(30), "user-1", now(), &rules));
        assert!(!can_cancel(&booking_in(-10), "user-1", now(), &rules));
    }

    #[test]
    fn test_unpaid_bookings_lapse() {
        let rules = CancellationRules::default();
        let stale = booking_in(600).with_status(BookingStatus::Pending);
        let denial = check_cancellation(&stale, "user-1", now(), &rules).unwrap_err();
        assert!(denial.reason.contains("Unpaid"));

        let mut fresh = booking_in(600).with_status(BookingStatus::Pending);
        fresh.created_at = now() - Duration::hours(2);
        assert!(can_cancel(&fresh, "user-1", now(), &rules));
    }

    #[test]
    fn test_modification_cutoff_is_two_hours() {
        let rules = CancellationRules::default();
        assert!(check_modification(&booking_in(121), "user-1", now(), &rules).is_ok());
        let denial = check_modification(&booking_in(90), "user-1", now(), &rules).unwrap_err();
        assert!(denial.reason.contains("120 minutes"));
    }
}
