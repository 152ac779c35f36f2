//! Error types for slot-engine operations.

use chrono::NaiveDate;
use thiserror::Error;

use crate::interval::Interval;

/// Boxed error returned by an [`AvailabilitySource`](crate::source::AvailabilitySource).
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid range: end {end} is before start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// An error raised by the data source, passed through untouched.
    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// A stored rule or window that cannot contribute availability.
///
/// Never returned to callers: the resolvers log it and skip the record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed {kind} for resource {resource_id}: {detail}")]
pub struct MalformedRecord {
    pub kind: &'static str,
    pub resource_id: String,
    pub detail: String,
}

/// Reject a missing or blank resource id.
pub(crate) fn require_resource_id(resource_id: &str) -> Result<()> {
    if resource_id.trim().is_empty() {
        return Err(EngineError::InvalidInput("resource id is required".to_string()));
    }
    Ok(())
}

/// The UTC day of `date`, or `InvalidInput` when its end cannot be represented.
pub(crate) fn representable_day(date: NaiveDate) -> Result<Interval> {
    Interval::try_for_day(date)
        .ok_or_else(|| EngineError::InvalidInput(format!("day {date} is out of the supported range")))
}

/// Keep the records that pass `check`, logging and dropping the rest.
pub(crate) fn well_formed<'a, T>(
    records: &'a [T],
    check: impl Fn(&T) -> std::result::Result<(), MalformedRecord> + 'a,
) -> impl Iterator<Item = &'a T> + 'a {
    records.iter().filter(move |record| match check(record) {
        Ok(()) => true,
        Err(malformed) => {
            tracing::warn!(%malformed, "skipping record");
            false
        }
    })
}
