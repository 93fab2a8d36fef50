//! Booking records supplied by the persistence collaborator

use crate::interval::TimeInterval;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created but not yet paid
    #[default]
    Pending,
    /// Accepted, binding reservation
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
    Refunded,
}

impl BookingStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::NoShow => "no_show",
            BookingStatus::Refunded => "refunded",
        }
    }

    /// Pending and confirmed bookings still hold their slot for the user
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booking as loaded by the storage layer. Read-only during one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: String,
    pub mentor_id: String,
    pub user_id: String,
    /// Mentorship session being booked
    #[serde(default)]
    pub session_id: String,
    pub interval: TimeInterval,
    #[serde(default)]
    pub status: BookingStatus,
    pub amount: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl BookingRecord {
    /// A confirmed, zero-amount booking; refine with the `with_*` setters
    pub fn new(
        id: impl Into<String>,
        mentor_id: impl Into<String>,
        user_id: impl Into<String>,
        interval: TimeInterval,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            mentor_id: mentor_id.into(),
            user_id: user_id.into(),
            session_id: String::new(),
            interval,
            status: BookingStatus::Confirmed,
            amount: 0.0,
            currency: "USD".to_string(),
            created_at,
            cancelled_at: None,
            notes: None,
        }
    }

    /// Replace the status
    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the amount charged and its currency
    pub fn with_amount(mut self, amount: f64, currency: impl Into<String>) -> Self {
        self.amount = amount;
        self.currency = currency.into();
        self
    }

    /// Attach the booked session
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Attach free-form notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Mark cancelled at `at`
    pub fn cancelled(mut self, at: DateTime<Utc>) -> Self {
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(at);
        self
    }

    /// Whether the booking still holds its slot
    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }

    /// Bookings that have not been paid for yet are kept in `Pending`
    pub fn is_paid(&self) -> bool {
        self.status != BookingStatus::Pending
    }

    /// Whether `user_id` is either party of this booking
    pub fn involves(&self, user_id: &str) -> bool {
        self.user_id == user_id || self.mentor_id == user_id
    }

    /// Session start instant
    pub fn start(&self) -> DateTime<Utc> {
        self.interval.start()
    }

    /// Fractional hours from `now` until the session starts (negative once started)
    pub fn hours_until_start(&self, now: DateTime<Utc>) -> f64 {
        (self.interval.start() - now).num_seconds() as f64 / 3600.0
    }
}
