//! Day-level availability over a date range.
//!
//! Precedence per day, strongest first: a full-day exception removes the
//! day; a dated window makes it available; a weekly rule valid on that date
//! makes it available; otherwise the day is unavailable. Partial-day
//! exceptions are ignored here and only matter at slot level.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::error::{representable_day, require_resource_id, well_formed, EngineError, Result};
use crate::interval::Interval;
use crate::policy::{weekday_number, DatedWindow, Exception, WeeklyRule};
use crate::source::AvailabilitySource;

/// Days in `[range_start, range_end]` with any availability, ascending.
///
/// Pure: operates on already-fetched records. Malformed rules and windows are
/// logged and skipped.
pub fn available_days(
    range_start: NaiveDate,
    range_end: NaiveDate,
    rules: &[WeeklyRule],
    windows: &[DatedWindow],
    exceptions: &[Exception],
) -> Vec<NaiveDate> {
    let custom_dates: HashSet<NaiveDate> = well_formed(windows, DatedWindow::validate)
        .map(|w| w.date)
        .collect();

    let blackout_dates: BTreeSet<NaiveDate> = exceptions
        .iter()
        .flat_map(|ex| ex.full_days_within(range_start, range_end))
        .collect();

    // Index rules by weekday.
    let mut by_weekday: [Vec<&WeeklyRule>; 7] = Default::default();
    for rule in well_formed(rules, WeeklyRule::validate) {
        by_weekday[usize::from(rule.weekday)].push(rule);
    }

    let days: Vec<NaiveDate> = range_start
        .iter_days()
        .take_while(|d| *d <= range_end)
        .filter(|d| {
            if blackout_dates.contains(d) {
                return false;
            }
            if custom_dates.contains(d) {
                return true;
            }
            by_weekday[usize::from(weekday_number(*d))]
                .iter()
                .any(|rule| rule.is_valid_on(*d))
        })
        .collect();

    tracing::debug!(
        %range_start,
        %range_end,
        available = days.len(),
        "resolved available days"
    );
    days
}

/// Fetch a resource's records from `source` and resolve its available days.
///
/// # Errors
/// - [`EngineError::InvalidInput`] for a blank resource id, an invalid config,
///   a range longer than `config.max_range_days` or a range ending on a day
///   whose end is not representable.
/// - [`EngineError::InvalidRange`] when `range_end < range_start`.
/// - [`EngineError::Source`] when the source fails.
pub fn find_available_days<S: AvailabilitySource + ?Sized>(
    source: &S,
    resource_id: &str,
    range_start: NaiveDate,
    range_end: NaiveDate,
    config: &EngineConfig,
) -> Result<Vec<NaiveDate>> {
    require_resource_id(resource_id)?;
    config.validate()?;
    if range_end < range_start {
        return Err(EngineError::InvalidRange {
            start: range_start,
            end: range_end,
        });
    }
    let span_days = (range_end - range_start).num_days() + 1;
    if span_days > i64::from(config.max_range_days) {
        return Err(EngineError::InvalidInput(format!(
            "range of {span_days} days exceeds the maximum of {}",
            config.max_range_days
        )));
    }

    let bounds = Interval::new(
        Interval::for_day(range_start).start,
        representable_day(range_end)?.end,
    );
    let rules = source.weekly_rules(resource_id)?;
    let windows = source.dated_windows(resource_id, range_start, range_end)?;
    let exceptions = source.exceptions(resource_id, bounds.start, bounds.end)?;

    Ok(available_days(
        range_start,
        range_end,
        &rules,
        &windows,
        &exceptions,
    ))
}
