//! Engine configuration
//!
//! Thresholds for the scheduling and cancellation rules. The defaults are the
//! production values; deployments can override any subset from YAML.

use crate::error::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Thresholds used by validation, availability and suggestions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingRules {
    // === Booking window ===

    /// Minimum notice between now and the session start
    pub lead_time_minutes: i64,

    /// First bookable hour of the day (UTC)
    pub business_open_hour: u32,

    /// Hour at which the bookable window closes (UTC)
    pub business_close_hour: u32,

    /// Weekdays on which sessions may be held
    pub business_days: Vec<Weekday>,

    // === Duration bounds ===

    pub min_duration_minutes: i64,
    pub max_duration_minutes: i64,

    // === Daily capacity ===

    /// A day with this many confirmed bookings is full
    pub max_daily_bookings: usize,

    /// A day with this many booked hours is full
    pub max_daily_hours: f64,

    // === Suggestions ===

    pub slot_step_minutes: i64,
    pub min_suggestions: usize,
    pub max_suggestions: usize,

    // === Recurrence ===

    /// Hard cap on recurrence stepping
    pub max_recurrence_iterations: usize,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            lead_time_minutes: 15,
            business_open_hour: 9,
            business_close_hour: 21,
            business_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            min_duration_minutes: 15,
            max_duration_minutes: 8 * 60,
            max_daily_bookings: 8,
            max_daily_hours: 8.0,
            slot_step_minutes: 30,
            min_suggestions: 1,
            max_suggestions: 20,
            max_recurrence_iterations: 1000,
        }
    }
}

impl SchedulingRules {
    /// Load rules from YAML; absent keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Minimum notice before a session starts
    pub fn lead_time(&self) -> Duration {
        Duration::minutes(self.lead_time_minutes)
    }

    /// Whether sessions may be held on `date`
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        self.business_days.contains(&date.weekday())
    }

    /// `[open, close)` on `date` in UTC. A close hour of 24 ends at midnight.
    pub fn business_window(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let midnight = date.and_time(NaiveTime::MIN).and_utc();
        (
            midnight + Duration::hours(i64::from(self.business_open_hour)),
            midnight + Duration::hours(i64::from(self.business_close_hour)),
        )
    }

    /// Next business day strictly after `date`
    pub fn next_business_day(&self, date: NaiveDate) -> NaiveDate {
        let mut next = date.succ_opt().unwrap_or(date);
        // A week always contains a business day unless the list is empty
        for _ in 0..7 {
            if self.is_business_day(next) {
                return next;
            }
            next = next.succ_opt().unwrap_or(next);
        }
        date.succ_opt().unwrap_or(date)
    }

    /// Clamp a requested suggestion count into the supported range
    pub fn clamp_suggestions(&self, count: usize) -> usize {
        count.clamp(self.min_suggestions, self.max_suggestions.max(self.min_suggestions))
    }
}

/// Thresholds used by cancellation, penalties and modifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CancellationRules {
    /// Cancellations must happen at least this long before the session
    pub cancellation_cutoff_minutes: i64,

    /// Unpaid bookings may only be cancelled within this window after creation
    pub unpaid_cancellation_window_hours: i64,

    // === Penalties ===

    pub late_cancellation_hours: f64,
    pub late_cancellation_percent: f64,
    pub short_notice_hours: f64,
    pub short_notice_percent: f64,

    /// Cancellations inside the lookback window that trigger the frequency surcharge
    pub frequent_cancellation_threshold: usize,
    pub frequent_cancellation_lookback_days: i64,
    pub frequent_cancellation_percent: f64,

    // === Processing fee ===

    pub processing_fee_percent: f64,
    pub minimum_processing_fee: f64,

    // === Modifications ===

    pub modification_cutoff_hours: i64,
    pub max_notes_chars: usize,
    pub modification_fee_window_hours: f64,
    pub modification_fee_percent: f64,
}

impl Default for CancellationRules {
    fn default() -> Self {
        Self {
            cancellation_cutoff_minutes: 30,
            unpaid_cancellation_window_hours: 24,
            late_cancellation_hours: 24.0,
            late_cancellation_percent: 25.0,
            short_notice_hours: 72.0,
            short_notice_percent: 10.0,
            frequent_cancellation_threshold: 3,
            frequent_cancellation_lookback_days: 90,
            frequent_cancellation_percent: 10.0,
            processing_fee_percent: 3.0,
            minimum_processing_fee: 5.0,
            modification_cutoff_hours: 2,
            max_notes_chars: 500,
            modification_fee_window_hours: 24.0,
            modification_fee_percent: 5.0,
        }
    }
}

impl CancellationRules {
    /// Load rules from YAML; absent keys keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Notice below which cancellation is refused
    pub fn cancellation_cutoff(&self) -> Duration {
        Duration::minutes(self.cancellation_cutoff_minutes)
    }

    /// Notice below which modification is refused
    pub fn modification_cutoff(&self) -> Duration {
        Duration::hours(self.modification_cutoff_hours)
    }

    /// Window for counting a user's recent cancellations
    pub fn lookback(&self) -> Duration {
        Duration::days(self.frequent_cancellation_lookback_days)
    }
}
