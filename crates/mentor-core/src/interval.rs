//! Half-open time intervals
//!
//! Every scheduling rule in the engine reasons about `[start, end)` ranges.
//! Two intervals that only touch at an endpoint do not overlap.

use crate::error::{EngineError, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An immutable `[start, end)` range with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = EngineError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        TimeInterval::new(raw.start, raw.end)
    }
}

impl TimeInterval {
    /// Create an interval, rejecting empty or inverted ranges
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(EngineError::InvalidInterval(format!(
                "start {} must precede end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self { start, end })
    }

    /// Create an interval from a start and a positive duration
    pub fn starting_at(start: DateTime<Utc>, duration: Duration) -> Result<Self> {
        let end = offset(start, duration)?;
        Self::new(start, end)
    }

    /// Inclusive start instant
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end instant
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the interval, always positive
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Length in whole minutes
    pub fn duration_minutes(&self) -> i64 {
        self.duration().num_minutes()
    }

    /// Duration in fractional hours
    pub fn duration_hours(&self) -> f64 {
        self.duration().num_seconds() as f64 / 3600.0
    }

    /// Calendar day (UTC) the interval starts on
    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Calendar day (UTC) the interval ends on
    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// Method form of [`overlaps`]
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        overlaps(self, other)
    }

    /// Minutes shared by both intervals, zero when they do not overlap
    pub fn overlap_minutes(&self, other: &TimeInterval) -> i64 {
        if !self.overlaps(other) {
            return 0;
        }
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (end - start).num_minutes()
    }

    /// Whether `other` lies entirely inside this interval
    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The same interval moved by `by`
    pub fn shift(&self, by: Duration) -> Result<Self> {
        Ok(Self {
            start: offset(self.start, by)?,
            end: offset(self.end, by)?,
        })
    }
}

fn offset(at: DateTime<Utc>, by: Duration) -> Result<DateTime<Utc>> {
    at.checked_add_signed(by).ok_or_else(|| {
        EngineError::InvalidInterval(format!(
            "{} offset by {}s leaves the representable range",
            at.to_rfc3339(),
            by.num_seconds()
        ))
    })
}

/// `a.start < b.end && a.end > b.start`
pub fn overlaps(a: &TimeInterval, b: &TimeInterval) -> bool {
    a.start < b.end && a.end > b.start
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, hour, minute, 0).unwrap()
    }

    fn interval(sh: u32, sm: u32, eh: u32, em: u32) -> TimeInterval {
        TimeInterval::new(at(sh, sm), at(eh, em)).unwrap()
    }

    #[test]
    fn test_rejects_inverted_and_empty() {
        assert!(TimeInterval::new(at(10, 0), at(9, 0)).is_err());
        assert!(TimeInterval::new(at(10, 0), at(10, 0)).is_err());
    }

    #[test]
    fn test_partial_overlap() {
        let booked = interval(14, 0, 15, 0);
        let candidate = interval(14, 30, 15, 30);
        assert!(overlaps(&booked, &candidate));
        assert_eq!(booked.overlap_minutes(&candidate), 30);
    }

    #[test]
    fn test_touching_is_not_overlap() {
        let booked = interval(14, 0, 15, 0);
        let next = interval(15, 0, 16, 0);
        assert!(!overlaps(&booked, &next));
        assert_eq!(booked.overlap_minutes(&next), 0);
    }

    #[test]
    fn test_contains_and_duration() {
        let outer = interval(9, 0, 12, 0);
        let inner = interval(10, 0, 11, 30);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert_eq!(inner.duration_minutes(), 90);
        assert!((inner.duration_hours() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok = r#"{"start":"2026-03-10T09:00:00Z","end":"2026-03-10T10:00:00Z"}"#;
        let parsed: TimeInterval = serde_json::from_str(ok).unwrap();
        assert_eq!(parsed.duration_minutes(), 60);

        let bad = r#"{"start":"2026-03-10T10:00:00Z","end":"2026-03-10T09:00:00Z"}"#;
        assert!(serde_json::from_str::<TimeInterval>(bad).is_err());
    }

    #[test]
    fn test_oversized_duration_is_an_error() {
        let huge = Duration::minutes(1_000_000_000_000);
        assert!(matches!(
            TimeInterval::starting_at(at(10, 0), huge),
            Err(EngineError::InvalidInterval(_))
        ));
        assert!(interval(9, 0, 10, 0).shift(huge).is_err());
        assert!(interval(9, 0, 10, 0).shift(-huge).is_err());
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(
            a_start in 0i64..10_000,
            a_len in 1i64..500,
            b_start in 0i64..10_000,
            b_len in 1i64..500,
        ) {
            let base = at(0, 0);
            let a = TimeInterval::starting_at(
                base + Duration::minutes(a_start),
                Duration::minutes(a_len),
            )
            .unwrap();
            let b = TimeInterval::starting_at(
                base + Duration::minutes(b_start),
                Duration::minutes(b_len),
            )
            .unwrap();
            prop_assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
        }

        #[test]
        fn prop_shift_by_length_never_overlaps(
            start in 0i64..10_000,
            len in 1i64..500,
            extra in 0i64..500,
        ) {
            let base = at(0, 0);
            let a = TimeInterval::starting_at(
                base + Duration::minutes(start),
                Duration::minutes(len),
            )
            .unwrap();
            let shifted = a.shift(Duration::minutes(len + extra)).unwrap();
            prop_assert!(!overlaps(&a, &shifted));
            prop_assert!(!overlaps(&shifted, &a));
        }
    }
}
