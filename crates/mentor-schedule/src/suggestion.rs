//! Alternative slot suggestions
//!
//! A bounded greedy scan of the preferred day's business window. Scores favor
//! slots near the preferred time, early steps and morning starts.

use crate::conflict::ConflictDetector;
use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};
use mentor_core::{BookingRecord, Clock, SchedulingRules, SystemClock, TimeInterval};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const BASE_SCORE: f64 = 1.0;
const MAX_DISTANCE_PENALTY: f64 = 0.5;
const DISTANCE_PENALTY_PER_HOUR: f64 = 0.1;
const STEP_PENALTY: f64 = 0.05;
const MORNING_BONUS: f64 = 0.1;
const MORNING_HOURS: std::ops::RangeInclusive<u32> = 9..=11;
const MIN_SCORE: f64 = 0.1;
const FALLBACK_SCORE: f64 = 0.5;

pub const FALLBACK_REASON: &str = "next available business day";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSuggestion {
    pub interval: TimeInterval,
    /// In `[0.1, 1.0]`, higher is better
    pub score: f64,
    pub reason: String,
}

pub struct SuggestionEngine {
    rules: SchedulingRules,
    clock: Arc<dyn Clock>,
    detector: ConflictDetector,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new(SchedulingRules::default(), Arc::new(SystemClock))
    }
}

impl SuggestionEngine {
    /// Engine using `rules` and `clock`
    pub fn new(rules: SchedulingRules, clock: Arc<dyn Clock>) -> Self {
        Self {
            rules,
            clock,
            detector: ConflictDetector::new(),
        }
    }

    /// Up to `count` slots of `duration_minutes` on the day of `preferred`, best first.
    ///
    /// `count` is clamped to the configured suggestion bounds. When the day has no
    /// free slot, a single suggestion at the next business day's opening is returned.
    pub fn suggest(
        &self,
        mentor_id: &str,
        preferred: DateTime<Utc>,
        duration_minutes: i64,
        count: usize,
        existing: &[BookingRecord],
    ) -> Vec<SlotSuggestion> {
        if duration_minutes <= 0 {
            tracing::warn!(
                mentor_id,
                duration_minutes,
                "cannot suggest slots for a non-positive duration"
            );
            return Vec::new();
        }
        let window_minutes = i64::from(
            self.rules
                .business_close_hour
                .saturating_sub(self.rules.business_open_hour),
        ) * 60;
        if duration_minutes > window_minutes {
            tracing::warn!(
                mentor_id,
                duration_minutes,
                window_minutes,
                "duration does not fit in the business window"
            );
            return Vec::new();
        }

        let now = self.clock.now();
        let count = self.rules.clamp_suggestions(count);
        let duration = Duration::minutes(duration_minutes);
        let earliest = now + self.rules.lead_time();
        let date = preferred.date_naive();

        let mut suggestions = Vec::with_capacity(count);
        if self.rules.is_business_day(date) {
            let (window_start, window_end) = self.rules.business_window(date);
            let step = Duration::minutes(self.rules.slot_step_minutes.max(1));

            let mut step_index = 0usize;
            let mut candidate = window_start;
            while candidate + duration <= window_end && suggestions.len() < count {
                if candidate > earliest {
                    if let Ok(interval) = TimeInterval::starting_at(candidate, duration) {
                        let report = self.detector.detect(mentor_id, &interval, existing, None);
                        let free = !report.has_conflicts;
                        if free {
                            suggestions.push(SlotSuggestion {
                                interval,
                                score: score(candidate, preferred, step_index),
                                reason: describe(candidate, preferred),
                            });
                        }
                    }
                }
                candidate += step;
                step_index += 1;
            }
        }

        if suggestions.is_empty() {
            let next = self.rules.next_business_day(date);
            let opening = next
                .and_time(NaiveTime::MIN)
                .and_utc()
                + Duration::hours(i64::from(self.rules.business_open_hour));
            tracing::info!(mentor_id, %date, fallback = %next, "no free slot on preferred day");
            if let Ok(interval) = TimeInterval::starting_at(opening, duration) {
                suggestions.push(SlotSuggestion {
                    interval,
                    score: FALLBACK_SCORE,
                    reason: FALLBACK_REASON.to_string(),
                });
            }
        }

        suggestions.sort_by(|a, b| b.score.total_cmp(&a.score));
        suggestions.truncate(count);
        tracing::debug!(mentor_id, suggestions = suggestions.len(), "slot suggestions computed");
        suggestions
    }
}

fn score(candidate: DateTime<Utc>, preferred: DateTime<Utc>, step_index: usize) -> f64 {
    let hours_away = (candidate - preferred).num_minutes().abs() as f64 / 60.0;
    let mut score = BASE_SCORE;
    score -= (DISTANCE_PENALTY_PER_HOUR * hours_away).min(MAX_DISTANCE_PENALTY);
    score -= STEP_PENALTY * step_index as f64;
    if MORNING_HOURS.contains(&candidate.hour()) {
        score += MORNING_BONUS;
    }
    score.clamp(MIN_SCORE, BASE_SCORE)
}

fn describe(candidate: DateTime<Utc>, preferred: DateTime<Utc>) -> String {
    if candidate == preferred {
        "preferred time".to_string()
    } else if MORNING_HOURS.contains(&candidate.hour()) {
        "morning slot".to_string()
    } else {
        format!("available at {}", candidate.format("%H:%M"))
    }
}
