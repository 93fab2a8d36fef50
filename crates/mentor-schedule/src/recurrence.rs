//! Recurrence expansion
//!
//! Expands a recurrence specification into the calendar dates of a session
//! series. Candidates are computed as `start + k * step` so monthly series do
//! not drift after short months.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, Utc, Weekday};
use mentor_core::{SchedulingRules, TimeInterval};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Rule family governing how a template session repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    /// A single occurrence
    #[default]
    None,
    Daily,
    Weekly,
    BiWeekly,
    Monthly,
    /// Steps like `Daily`; there are no custom step fields yet
    Custom,
}

/// Recurrence configuration. Only the fields relevant to `pattern` are consulted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceSpec {
    pub pattern: RecurrencePattern,
    /// Every N units of the pattern
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Weekly/BiWeekly filter; empty means any weekday
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,
    /// Monthly filter; defaults to the start date's day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    /// Last date that may be generated (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_occurrences: Option<usize>,
    #[serde(default)]
    pub excluded_dates: BTreeSet<NaiveDate>,
}

fn default_interval() -> u32 {
    1
}

impl RecurrenceSpec {
    /// A single occurrence
    pub fn none() -> Self {
        Self::with_pattern(RecurrencePattern::None)
    }

    /// Every day
    pub fn daily() -> Self {
        Self::with_pattern(RecurrencePattern::Daily)
    }

    /// Every week on the start date's weekday
    pub fn weekly() -> Self {
        Self::with_pattern(RecurrencePattern::Weekly)
    }

    /// Every week on the given weekdays
    pub fn weekly_on(days: impl IntoIterator<Item = Weekday>) -> Self {
        Self {
            days_of_week: days.into_iter().collect(),
            ..Self::weekly()
        }
    }

    /// Every other week
    pub fn biweekly() -> Self {
        Self::with_pattern(RecurrencePattern::BiWeekly)
    }

    /// Every month on the start date's day
    pub fn monthly() -> Self {
        Self::with_pattern(RecurrencePattern::Monthly)
    }

    /// Every month on `day`
    pub fn monthly_on(day: u32) -> Self {
        Self {
            day_of_month: Some(day),
            ..Self::monthly()
        }
    }

    pub fn custom() -> Self {
        Self::with_pattern(RecurrencePattern::Custom)
    }

    fn with_pattern(pattern: RecurrencePattern) -> Self {
        Self {
            pattern,
            interval: 1,
            ..Default::default()
        }
    }

    /// Set the interval (values below 1 are treated as 1)
    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Last date the series may reach
    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Cap the number of occurrences
    pub fn times(mut self, count: usize) -> Self {
        self.max_occurrences = Some(count);
        self
    }

    /// Skip `date`
    pub fn excluding(mut self, date: NaiveDate) -> Self {
        self.excluded_dates.insert(date);
        self
    }

    fn effective_interval(&self) -> u32 {
        self.interval.max(1)
    }
}

/// Expands [`RecurrenceSpec`]s into concrete dates
#[derive(Debug, Clone)]
pub struct RecurrenceGenerator {
    max_iterations: usize,
}

impl Default for RecurrenceGenerator {
    fn default() -> Self {
        Self::new(&SchedulingRules::default())
    }
}

impl RecurrenceGenerator {
    pub fn new(rules: &SchedulingRules) -> Self {
        Self {
            max_iterations: rules.max_recurrence_iterations,
        }
    }

    /// Ordered dates of the series starting at `start`.
    ///
    /// Stops at `end_date`, at `max_occurrences`, or after the iteration cap,
    /// whichever comes first.
    pub fn generate(&self, start: NaiveDate, spec: &RecurrenceSpec) -> Vec<NaiveDate> {
        if spec.pattern == RecurrencePattern::None {
            return vec![start];
        }

        let mut dates = Vec::new();
        let mut capped = true;

        for step in 0..self.max_iterations {
            if spec.max_occurrences.is_some_and(|max| dates.len() >= max) {
                capped = false;
                break;
            }
            let Some(candidate) = nth_candidate(start, spec, step) else {
                capped = false;
                break;
            };
            if spec.end_date.is_some_and(|end| candidate > end) {
                capped = false;
                break;
            }
            if includes(candidate, start, spec) {
                dates.push(candidate);
            }
        }

        if capped {
            tracing::warn!(
                pattern = ?spec.pattern,
                iterations = self.max_iterations,
                generated = dates.len(),
                "recurrence expansion hit the iteration cap"
            );
        } else {
            tracing::debug!(
                pattern = ?spec.pattern,
                generated = dates.len(),
                "recurrence expanded"
            );
        }

        dates
    }

    /// Session intervals for each generated date, at the template's start time
    pub fn occurrences(
        &self,
        template_start: DateTime<Utc>,
        duration: Duration,
        spec: &RecurrenceSpec,
    ) -> Vec<TimeInterval> {
        let time = template_start.time();
        self.generate(template_start.date_naive(), spec)
            .into_iter()
            .filter_map(|date| {
                TimeInterval::starting_at(date.and_time(time).and_utc(), duration).ok()
            })
            .collect()
    }
}

/// Pattern-only membership check with no series anchor.
///
/// **A monthly spec without `day_of_month` accepts every date here**, whereas
/// [`RecurrenceGenerator::generate`] falls back to the start date's day. Use
/// [`is_date_in_series`] when the series start is known. Stepping alignment and
/// `end_date` are not considered.
pub fn is_date_in_recurrence(date: NaiveDate, spec: &RecurrenceSpec) -> bool {
    if spec.excluded_dates.contains(&date) {
        return false;
    }
    match spec.pattern {
        RecurrencePattern::Weekly | RecurrencePattern::BiWeekly => weekday_allowed(date, spec),
        RecurrencePattern::Monthly => spec.day_of_month.map_or(true, |day| date.day() == day),
        RecurrencePattern::None | RecurrencePattern::Daily | RecurrencePattern::Custom => true,
    }
}

/// Membership check anchored at the series `start`, using the same inclusion
/// predicate as [`RecurrenceGenerator::generate`].
///
/// Stepping alignment and `end_date` are not considered.
pub fn is_date_in_series(date: NaiveDate, start: NaiveDate, spec: &RecurrenceSpec) -> bool {
    includes(date, start, spec)
}

fn includes(candidate: NaiveDate, start: NaiveDate, spec: &RecurrenceSpec) -> bool {
    if spec.excluded_dates.contains(&candidate) {
        return false;
    }
    match spec.pattern {
        RecurrencePattern::Weekly | RecurrencePattern::BiWeekly => {
            weekday_allowed(candidate, spec)
        }
        RecurrencePattern::Monthly => {
            candidate.day() == spec.day_of_month.unwrap_or_else(|| start.day())
        }
        RecurrencePattern::None | RecurrencePattern::Daily | RecurrencePattern::Custom => true,
    }
}

fn weekday_allowed(date: NaiveDate, spec: &RecurrenceSpec) -> bool {
    spec.days_of_week.is_empty() || spec.days_of_week.contains(&date.weekday())
}

/// `start + step * unit`, or `None` once the calendar range is exhausted
fn nth_candidate(start: NaiveDate, spec: &RecurrenceSpec, step: usize) -> Option<NaiveDate> {
    let step = u32::try_from(step).ok()?;
    let interval = spec.effective_interval();
    let days_per_step = match spec.pattern {
        RecurrencePattern::Daily | RecurrencePattern::Custom => 1u32,
        RecurrencePattern::Weekly => 7,
        RecurrencePattern::BiWeekly => 14,
        RecurrencePattern::Monthly => {
            let months = step.checked_mul(interval)?;
            return start.checked_add_months(Months::new(months));
        }
        RecurrencePattern::None => return if step == 0 { Some(start) } else { None },
    };
    let days = step.checked_mul(interval)?.checked_mul(days_per_step)?;
    start.checked_add_days(Days::new(u64::from(days)))
}
