//! Mentor Policy: cancellation and modification settlement
//!
//! Selects a cancellation policy for a booking, computes the tiered refund,
//! notice and frequency penalties and the processing fee, and applies the
//! special-circumstance override. Every decision is a structured outcome.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use mentor_core::{BookingRecord, FixedClock, InMemoryBookingStore, TimeInterval};
//! use mentor_policy::CancellationPolicyEngine;
//! use std::sync::Arc;
//!
//! let now = Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap();
//! let interval =
//!     TimeInterval::starting_at(now + Duration::hours(20), Duration::hours(1)).unwrap();
//! let booking = BookingRecord::new("b-1", "mentor-1", "user-1", interval, now - Duration::days(3))
//!     .with_amount(200.0, "USD");
//!
//! let store = Arc::new(InMemoryBookingStore::new().with_booking(booking));
//! let engine = CancellationPolicyEngine::new(store, Arc::new(FixedClock::new(now)));
//!
//! let settlement = engine.evaluate("b-1", "user-1", "schedule conflict");
//! assert!(settlement.is_allowed);
//! assert_eq!(settlement.estimated_net_refund, -6.0);
//! ```

pub mod audit;
pub mod catalog;
pub mod eligibility;
pub mod engine;
pub mod settlement;
pub mod special_circumstances;

pub use audit::{AuditEntry, AuditEventType, AuditLog, AuditStats};
pub use catalog::{CancellationPolicy, PolicyCatalog, RefundTier};
pub use eligibility::{can_cancel, check_cancellation, check_modification, Denial, DenialKind};
pub use engine::{BookingUpdate, CancellationPolicyEngine, ModificationDecision, SettlementResult};
pub use settlement::{
    calculate_penalty, calculate_refund, processing_fee, CancellationPenalty, PenaltyType,
    RefundCalculation,
};
pub use special_circumstances::{detect_special_circumstances, SPECIAL_CIRCUMSTANCE_KEYWORDS};
