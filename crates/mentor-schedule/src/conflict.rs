//! Conflict detection against confirmed bookings

use mentor_core::{overlaps, BookingRecord, TimeInterval};
use serde::{Deserialize, Serialize};

/// Confirmed bookings that overlap a candidate interval
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub has_conflicts: bool,
    pub conflicting: Vec<BookingRecord>,
}

impl ConflictReport {
    pub fn new(conflicting: Vec<BookingRecord>) -> Self {
        Self {
            has_conflicts: !conflicting.is_empty(),
            conflicting,
        }
    }

    /// Ids of the conflicting bookings
    pub fn booking_ids(&self) -> Vec<String> {
        self.conflicting.iter().map(|b| b.id.clone()).collect()
    }
}

/// Conflicts of one occurrence of a recurring series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesConflict {
    pub occurrence: TimeInterval,
    pub conflicting: Vec<BookingRecord>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    pub fn new() -> Self {
        Self
    }

    /// Confirmed bookings of `mentor_id` overlapping `candidate`, skipping `exclude_id`
    pub fn detect(
        &self,
        mentor_id: &str,
        candidate: &TimeInterval,
        existing: &[BookingRecord],
        exclude_id: Option<&str>,
    ) -> ConflictReport {
        let conflicting: Vec<BookingRecord> = existing
            .iter()
            .filter(|b| b.is_confirmed() && b.mentor_id == mentor_id)
            .filter(|b| exclude_id != Some(b.id.as_str()))
            .filter(|b| overlaps(candidate, &b.interval))
            .cloned()
            .collect();

        if !conflicting.is_empty() {
            tracing::debug!(
                mentor_id,
                candidate = %candidate,
                conflicts = conflicting.len(),
                "candidate overlaps confirmed bookings"
            );
        }

        ConflictReport::new(conflicting)
    }

    /// Per-occurrence conflicts for a whole series; clean occurrences are omitted
    pub fn detect_series(
        &self,
        mentor_id: &str,
        occurrences: &[TimeInterval],
        existing: &[BookingRecord],
        exclude_id: Option<&str>,
    ) -> Vec<SeriesConflict> {
        occurrences
            .iter()
            .filter_map(|occurrence| {
                let report = self.detect(mentor_id, occurrence, existing, exclude_id);
                report.has_conflicts.then(|| SeriesConflict {
                    occurrence: *occurrence,
                    conflicting: report.conflicting,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use mentor_core::BookingStatus;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, minute, 0).unwrap()
    }

    fn span(day: u32, hour: u32, minute: u32, minutes: i64) -> TimeInterval {
        TimeInterval::starting_at(at(day, hour, minute), Duration::minutes(minutes)).unwrap()
    }

    fn booking(id: &str, interval: TimeInterval) -> BookingRecord {
        BookingRecord::new(id, "mentor-1", "user-1", interval, at(1, 8, 0))
    }

    #[test]
    fn test_overlap_and_boundary() {
        let existing = vec![booking("b-1", span(10, 14, 0, 60))];
        let detector = ConflictDetector::new();

        let report = detector.detect("mentor-1", &span(10, 14, 30, 60), &existing, None);
        assert!(report.has_conflicts);
        assert_eq!(report.booking_ids(), vec!["b-1".to_string()]);

        let report = detector.detect("mentor-1", &span(10, 15, 0, 60), &existing, None);
        assert!(!report.has_conflicts);
        assert!(report.conflicting.is_empty());
    }

    #[test]
    fn test_only_confirmed_bookings_conflict() {
        let existing = vec![
            booking("pending", span(10, 14, 0, 60)).with_status(BookingStatus::Pending),
            booking("cancelled", span(10, 14, 0, 60)).with_status(BookingStatus::Cancelled),
            booking("completed", span(10, 14, 0, 60)).with_status(BookingStatus::Completed),
        ];
        let report =
            ConflictDetector::new().detect("mentor-1", &span(10, 14, 0, 60), &existing, None);
        assert!(!report.has_conflicts);
    }

    #[test]
    fn test_exclude_id_and_other_mentors() {
        let mut other = booking("b-2", span(10, 14, 0, 60));
        other.mentor_id = "mentor-2".to_string();
        let existing = vec![booking("b-1", span(10, 14, 0, 60)), other];

        let report = ConflictDetector::new().detect(
            "mentor-1",
            &span(10, 14, 0, 60),
            &existing,
            Some("b-1"),
        );
        assert!(!report.has_conflicts);
    }

    #[test]
    fn test_series_conflicts() {
        let existing = vec![booking("b-1", span(17, 10, 0, 60))];
        let occurrences = vec![span(10, 10, 0, 60), span(17, 10, 0, 60), span(24, 10, 0, 60)];

        let conflicts =
            ConflictDetector::new().detect_series("mentor-1", &occurrences, &existing, None);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].occurrence, occurrences[1]);
        assert_eq!(conflicts[0].conflicting[0].id, "b-1");
    }
}
