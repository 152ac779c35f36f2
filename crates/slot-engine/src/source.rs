//! Read-only data access for the resolvers.
//!
//! The engine never talks to storage directly. Callers implement
//! [`AvailabilitySource`] over whatever store they use; [`Snapshot`] is the
//! in-memory implementation used by the CLI and the tests.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::interval::Interval;
use crate::policy::{DatedWindow, Exception, Reservation, Service, WeeklyRule};

/// Narrow repository interface scoped by resource id.
///
/// Implementations may perform blocking I/O; any error they return is passed
/// through the resolvers unchanged as [`EngineError::Source`](crate::EngineError::Source).
pub trait AvailabilitySource {
    /// Every weekly rule of the resource, whatever its validity bounds.
    fn weekly_rules(&self, resource_id: &str) -> Result<Vec<WeeklyRule>, SourceError>;

    /// Dated windows whose date lies in `[from, to]`.
    fn dated_windows(
        &self,
        resource_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DatedWindow>, SourceError>;

    /// Exceptions overlapping `[start, end)`.
    fn exceptions(
        &self,
        resource_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Exception>, SourceError>;

    /// Pending or confirmed reservations overlapping `[start, end)`.
    fn reservations(
        &self,
        resource_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, SourceError>;

    /// Services configured for the resource, in configuration order.
    fn services(&self, resource_id: &str) -> Result<Vec<Service>, SourceError>;
}

/// An immutable in-memory copy of a resource store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub weekly_rules: Vec<WeeklyRule>,
    pub dated_windows: Vec<DatedWindow>,
    pub exceptions: Vec<Exception>,
    pub reservations: Vec<Reservation>,
    pub services: Vec<Service>,
}

impl AvailabilitySource for Snapshot {
    fn weekly_rules(&self, resource_id: &str) -> Result<Vec<WeeklyRule>, SourceError> {
        Ok(self
            .weekly_rules
            .iter()
            .filter(|r| r.resource_id == resource_id)
            .cloned()
            .collect())
    }

    fn dated_windows(
        &self,
        resource_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DatedWindow>, SourceError> {
        Ok(self
            .dated_windows
            .iter()
            .filter(|w| w.resource_id == resource_id && w.date >= from && w.date <= to)
            .cloned()
            .collect())
    }

    fn exceptions(
        &self,
        resource_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Exception>, SourceError> {
        let window = Interval::new(start, end);
        Ok(self
            .exceptions
            .iter()
            .filter(|e| e.resource_id == resource_id && e.interval().overlaps(&window))
            .cloned()
            .collect())
    }

    fn reservations(
        &self,
        resource_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, SourceError> {
        let window = Interval::new(start, end);
        Ok(self
            .reservations
            .iter()
            .filter(|r| {
                r.resource_id == resource_id
                    && r.status.blocks_time()
                    && r.interval().overlaps(&window)
            })
            .cloned()
            .collect())
    }

    fn services(&self, resource_id: &str) -> Result<Vec<Service>, SourceError> {
        Ok(self
            .services
            .iter()
            .filter(|s| s.resource_id == resource_id)
            .cloned()
            .collect())
    }
}
