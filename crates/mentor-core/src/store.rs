//! Storage collaborator seam
//!
//! The engines never perform I/O. They receive bookings either directly as
//! slices or through a [`BookingStore`] implemented by the persistence layer.
//!
//! # Double-booking contract
//!
//! Conflict checks run against a snapshot. Whoever creates bookings must
//! serialize check-then-create per mentor, otherwise two requests validated
//! against the same snapshot can both confirm overlapping sessions.
//! [`InMemoryBookingStore::create_checked`] shows the required shape: the check
//! and the insert happen under one write lock.

use crate::booking::BookingRecord;
use crate::error::{EngineError, Result};
use crate::interval::TimeInterval;
use crate::verdict::ValidationResult;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Lookups the engines need from the persistence layer
pub trait BookingStore: Send + Sync {
    /// A single booking by id
    fn booking(&self, id: &str) -> Result<Option<BookingRecord>>;

    /// All bookings of a mentor, optionally restricted to those overlapping `range`
    fn mentor_bookings(
        &self,
        mentor_id: &str,
        range: Option<&TimeInterval>,
    ) -> Result<Vec<BookingRecord>>;

    /// Number of bookings `user_id` cancelled at or after `since`
    fn cancellations_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<usize>;

    fn session_exists(&self, session_id: &str) -> Result<bool>;

    fn user_exists(&self, user_id: &str) -> Result<bool>;

    /// Whether the user already holds a pending or confirmed booking for the session
    fn has_active_booking(&self, user_id: &str, session_id: &str) -> Result<bool>;
}

/// Reference store kept in memory
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<Vec<BookingRecord>>,
    sessions: RwLock<HashSet<String>>,
    users: RwLock<HashSet<String>>,
    unavailable: AtomicBool,
}

impl InMemoryBookingStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a known user
    pub fn with_user(self, user_id: impl Into<String>) -> Self {
        self.users.write().insert(user_id.into());
        self
    }

    /// Register a known session
    pub fn with_session(self, session_id: impl Into<String>) -> Self {
        self.sessions.write().insert(session_id.into());
        self
    }

    /// Seed a booking
    pub fn with_booking(self, booking: BookingRecord) -> Self {
        self.insert(booking);
        self
    }

    /// Insert or replace a booking by id
    pub fn insert(&self, booking: BookingRecord) {
        let mut bookings = self.bookings.write();
        match bookings.iter_mut().find(|b| b.id == booking.id) {
            Some(existing) => *existing = booking,
            None => bookings.push(booking),
        }
    }

    /// Run `check` against the mentor's current bookings and insert `booking`
    /// only if it passes, atomically with respect to other writers.
    pub fn create_checked<F>(&self, booking: BookingRecord, check: F) -> Result<ValidationResult>
    where
        F: FnOnce(&[BookingRecord]) -> ValidationResult,
    {
        self.ensure_available()?;
        let mut bookings = self.bookings.write();
        let mentor_bookings: Vec<BookingRecord> = bookings
            .iter()
            .filter(|b| b.mentor_id == booking.mentor_id)
            .cloned()
            .collect();

        let result = check(&mentor_bookings);
        if result.is_valid() {
            tracing::debug!(
                booking_id = %booking.id,
                mentor_id = %booking.mentor_id,
                "booking created"
            );
            bookings.push(booking);
        }
        Ok(result)
    }

    /// Number of stored bookings
    pub fn len(&self) -> usize {
        self.bookings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.read().is_empty()
    }

    /// Snapshot of every booking
    pub fn all(&self) -> Vec<BookingRecord> {
        self.bookings.read().clone()
    }

    /// Make every lookup fail with [`EngineError::Store`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(EngineError::Store("booking store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl BookingStore for InMemoryBookingStore {
    fn booking(&self, id: &str) -> Result<Option<BookingRecord>> {
        self.ensure_available()?;
        Ok(self.bookings.read().iter().find(|b| b.id == id).cloned())
    }

    fn mentor_bookings(
        &self,
        mentor_id: &str,
        range: Option<&TimeInterval>,
    ) -> Result<Vec<BookingRecord>> {
        self.ensure_available()?;
        Ok(self
            .bookings
            .read()
            .iter()
            .filter(|b| b.mentor_id == mentor_id)
            .filter(|b| range.map_or(true, |r| r.overlaps(&b.interval)))
            .cloned()
            .collect())
    }

    fn cancellations_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<usize> {
        self.ensure_available()?;
        Ok(self
            .bookings
            .read()
            .iter()
            .filter(|b| b.user_id == user_id)
            .filter(|b| b.cancelled_at.map_or(false, |at| at >= since))
            .count())
    }

    fn session_exists(&self, session_id: &str) -> Result<bool> {
        self.ensure_available()?;
        Ok(self.sessions.read().contains(session_id))
    }

    fn user_exists(&self, user_id: &str) -> Result<bool> {
        self.ensure_available()?;
        Ok(self.users.read().contains(user_id))
    }

    fn has_active_booking(&self, user_id: &str, session_id: &str) -> Result<bool> {
        self.ensure_available()?;
        Ok(self
            .bookings
            .read()
            .iter()
            .any(|b| b.user_id == user_id && b.session_id == session_id && b.status.is_active()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingStatus;
    use crate::verdict::Violation;
    use chrono::{Duration, TimeZone};

    fn booking(id: &str, mentor: &str, hour: u32) -> BookingRecord {
        let start = Utc.with_ymd_and_hms(2026, 3, 10, hour, 0, 0).unwrap();
        let interval = TimeInterval::starting_at(start, Duration::hours(1)).unwrap();
        BookingRecord::new(id, mentor, "user-1", interval, start - Duration::days(2))
            .with_session("s-1")
    }

    #[test]
    fn test_lookup_by_id_and_mentor() {
        let store = InMemoryBookingStore::new()
            .with_booking(booking("b-1", "m-1", 10))
            .with_booking(booking("b-2", "m-1", 14))
            .with_booking(booking("b-3", "m-2", 10));

        assert_eq!(store.booking("b-2").unwrap().unwrap().mentor_id, "m-1");
        assert!(store.booking("missing").unwrap().is_none());
        assert_eq!(store.mentor_bookings("m-1", None).unwrap().len(), 2);

        let morning = TimeInterval::new(
            Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
        )
        .unwrap();
        let filtered = store.mentor_bookings("m-1", Some(&morning)).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "b-1");
    }

    #[test]
    fn test_insert_replaces_by_id() {
        let store = InMemoryBookingStore::new().with_booking(booking("b-1", "m-1", 10));
        store.insert(booking("b-1", "m-1", 10).with_status(BookingStatus::Completed));
        assert_eq!(store.len(), 1);
        assert_eq!(store.booking("b-1").unwrap().unwrap().status, BookingStatus::Completed);
    }

    #[test]
    fn test_cancellations_since() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let store = InMemoryBookingStore::new()
            .with_booking(booking("b-1", "m-1", 10).cancelled(now - Duration::days(10)))
            .with_booking(booking("b-2", "m-1", 11).cancelled(now - Duration::days(120)))
            .with_booking(booking("b-3", "m-1", 12));

        assert_eq!(store.cancellations_since("user-1", now - Duration::days(90)).unwrap(), 1);
    }

    #[test]
    fn test_active_booking_and_directory() {
        let store = InMemoryBookingStore::new()
            .with_user("user-1")
            .with_session("s-1")
            .with_booking(booking("b-1", "m-1", 10));

        assert!(store.user_exists("user-1").unwrap());
        assert!(!store.user_exists("user-2").unwrap());
        assert!(store.session_exists("s-1").unwrap());
        assert!(store.has_active_booking("user-1", "s-1").unwrap());

        store.insert(booking("b-1", "m-1", 10).with_status(BookingStatus::Cancelled));
        assert!(!store.has_active_booking("user-1", "s-1").unwrap());
    }

    #[test]
    fn test_create_checked_rejects_failed_check() {
        let store = InMemoryBookingStore::new();
        let result = store
            .create_checked(booking("b-1", "m-1", 10), |_| {
                vec![Violation::new("conflict", "taken")].into_iter().collect()
            })
            .unwrap();
        assert!(!result.is_valid());
        assert!(store.is_empty());

        let result = store
            .create_checked(booking("b-1", "m-1", 10), |_| ValidationResult::valid())
            .unwrap();
        assert!(result.is_valid());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unavailable_store_errors() {
        let store = InMemoryBookingStore::new();
        store.set_unavailable(true);
        assert!(matches!(store.booking("b-1"), Err(EngineError::Store(_))));
        assert!(store
            .create_checked(booking("b-1", "m-1", 10), |_| ValidationResult::valid())
            .is_err());
    }
}
