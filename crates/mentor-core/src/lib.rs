//! Mentor Core: value types and seams shared by the booking engines
//!
//! The scheduling and cancellation engines are pure functions of their inputs.
//! This crate holds what they share: the half-open [`TimeInterval`], booking
//! records handed over by the persistence layer, accumulated validation
//! outcomes, the injected [`Clock`], rule thresholds, and the
//! [`BookingStore`] collaborator trait.

pub mod booking;
pub mod clock;
pub mod config;
pub mod error;
pub mod interval;
pub mod store;
pub mod verdict;

pub use booking::{BookingRecord, BookingStatus};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CancellationRules, SchedulingRules};
pub use error::{EngineError, Result};
pub use interval::{overlaps, TimeInterval};
pub use store::{BookingStore, InMemoryBookingStore};
pub use verdict::{ValidationResult, Violation};

/// Engine version stamped into audit records
pub const ENGINE_VERSION: &str = "1.0.0";
