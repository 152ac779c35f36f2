//! # slot-engine
//!
//! Deterministic availability for bookable resources.
//!
//! Given a resource's weekly rules, one-off dated windows, blackout
//! exceptions and existing reservations, the engine answers two questions:
//! which days in a range have any availability, and which start times on one
//! day can fit a given service. All days are UTC midnight to UTC midnight.
//!
//! The resolvers are pure functions over plain data. Storage stays behind the
//! [`AvailabilitySource`] trait; nothing here performs I/O or keeps state.
//!
//! ## Modules
//!
//! - [`interval`] — half-open interval merge and subtraction
//! - [`policy`] — rules, windows, exceptions, reservations, service policies
//! - [`source`] — read-only data access trait and an in-memory snapshot
//! - [`days`] — available days over a date range
//! - [`slots`] — bookable slot start times for one day
//! - [`config`] — grid step and range limits
//! - [`error`] — Error types

pub mod config;
pub mod days;
pub mod error;
pub mod interval;
pub mod policy;
pub mod slots;
pub mod source;

pub use config::EngineConfig;
pub use days::{available_days, find_available_days};
pub use error::{EngineError, MalformedRecord, Result};
pub use interval::{merge, subtract, Interval};
pub use policy::{
    resolve_policy, DatedWindow, Exception, Reservation, ReservationStatus, Service,
    ServicePolicy, TimeOfDay, WeeklyRule, DEFAULT_POLICY,
};
pub use slots::{available_slots, find_available_slots, is_slot_bookable, DayRecords, Slot};
pub use source::{AvailabilitySource, Snapshot};
