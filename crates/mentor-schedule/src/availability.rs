//! Daily load and capacity checks

use chrono::{Days, NaiveDate, NaiveTime};
use mentor_core::{BookingRecord, SchedulingRules};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Confirmed load on one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLoad {
    pub date: NaiveDate,
    pub bookings: usize,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub is_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Confirmed bookings inside the requested range
    pub booked_slots: Vec<BookingRecord>,
    /// Per-day load in date order
    #[serde(default)]
    pub daily_load: Vec<DailyLoad>,
}

/// Aggregates a mentor's confirmed bookings into daily load
#[derive(Debug, Clone, Default)]
pub struct AvailabilityCalculator {
    rules: SchedulingRules,
}

impl AvailabilityCalculator {
    pub fn new(rules: SchedulingRules) -> Self {
        Self { rules }
    }

    /// Capacity report for `mentor_id` over `[start_date, end_date]` (both inclusive).
    ///
    /// The first day, in date order, at or over either daily limit makes the
    /// mentor unavailable.
    pub fn availability(
        &self,
        mentor_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        existing: &[BookingRecord],
    ) -> AvailabilityReport {
        let range_start = start_date.and_time(NaiveTime::MIN).and_utc();
        let range_end = end_date
            .checked_add_days(Days::new(1))
            .unwrap_or(end_date)
            .and_time(NaiveTime::MIN)
            .and_utc();

        let booked_slots: Vec<BookingRecord> = existing
            .iter()
            .filter(|b| b.is_confirmed() && b.mentor_id == mentor_id)
            .filter(|b| b.interval.start() >= range_start && b.interval.end() <= range_end)
            .cloned()
            .collect();

        let mut by_day: BTreeMap<NaiveDate, DailyLoad> = BTreeMap::new();
        for booking in &booked_slots {
            let date = booking.interval.start_date();
            let load = by_day.entry(date).or_insert(DailyLoad {
                date,
                bookings: 0,
                hours: 0.0,
            });
            load.bookings += 1;
            load.hours += booking.interval.duration_hours();
        }
        let daily_load: Vec<DailyLoad> = by_day.into_values().collect();

        let reason = daily_load.iter().find_map(|load| self.breach(load));
        if let Some(reason) = &reason {
            tracing::info!(mentor_id, %reason, "mentor at capacity");
        }

        AvailabilityReport {
            is_available: reason.is_none(),
            reason,
            booked_slots,
            daily_load,
        }
    }

    fn breach(&self, load: &DailyLoad) -> Option<String> {
        if load.bookings >= self.rules.max_daily_bookings {
            Some(format!(
                "Maximum bookings limit ({}) reached on {}",
                self.rules.max_daily_bookings, load.date
            ))
        } else if load.hours >= self.rules.max_daily_hours {
            Some(format!(
                "Maximum working hours ({}h) reached on {}",
                self.rules.max_daily_hours, load.date
            ))
        } else {
            None
        }
    }
}
