//! Mentor Schedule: booking-window engines
//!
//! Recurrence expansion, conflict detection, time slot validation, daily
//! capacity and alternative slot suggestions. Every engine works on a snapshot
//! of bookings and reads the injected clock once per call.

pub mod availability;
pub mod conflict;
pub mod recurrence;
pub mod suggestion;
pub mod validator;

pub use availability::{AvailabilityCalculator, AvailabilityReport, DailyLoad};
pub use conflict::{ConflictDetector, ConflictReport, SeriesConflict};
pub use recurrence::{
    is_date_in_recurrence, is_date_in_series, RecurrenceGenerator, RecurrencePattern,
    RecurrenceSpec,
};
pub use suggestion::{SlotSuggestion, SuggestionEngine, FALLBACK_REASON};
pub use validator::{rules, BookingRequest, TimeSlotValidator};
