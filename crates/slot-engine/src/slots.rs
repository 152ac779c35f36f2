//! Bookable start times for a single UTC day.
//!
//! Open time comes from the day's dated windows when any exist, otherwise
//! from the weekly rules valid on that date; the two sources never mix.
//! Exceptions, blocking reservations and same-day constraints are subtracted,
//! service buffers shrink what is left, and candidates are laid out on a
//! fixed grid from the start of each remaining interval.

use std::fmt;

use chrono::{DateTime, Duration, DurationRound, NaiveDate, Utc};
use serde::{Serialize, Serializer};

use crate::config::EngineConfig;
use crate::error::{representable_day, require_resource_id, well_formed, EngineError, Result};
use crate::interval::{clip_all, merge, subtract, Interval};
use crate::policy::{
    resolve_policy, DatedWindow, Exception, Reservation, ServicePolicy, TimeOfDay, WeeklyRule,
};
use crate::source::AvailabilitySource;

/// One bookable occurrence. Serializes and displays as its `"HH:MM"` start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub time: TimeOfDay,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.time, f)
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&self.time)
    }
}

/// The records relevant to one day, already fetched.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayRecords<'a> {
    pub rules: &'a [WeeklyRule],
    pub windows: &'a [DatedWindow],
    pub exceptions: &'a [Exception],
    pub reservations: &'a [Reservation],
}

/// Open intervals for `date`, before anything is subtracted.
///
/// Dated windows for the date replace the weekly rules entirely.
pub fn open_intervals(date: NaiveDate, records: &DayRecords<'_>) -> Vec<Interval> {
    let day = Interval::for_day(date);

    let windows: Vec<Interval> = well_formed(records.windows, DatedWindow::validate)
        .filter(|w| w.date == date)
        .map(DatedWindow::interval)
        .collect();
    if !windows.is_empty() {
        return merge(&clip_all(&windows, &day));
    }

    let rules: Vec<Interval> = well_formed(records.rules, WeeklyRule::validate)
        .filter(|r| r.applies_on(date))
        .map(|r| r.interval_on(date))
        .collect();
    clip_all(&merge(&rules), &day)
}

/// Blocks that only apply when `date` is today: the same-day cutoff window
/// and the lead-time window.
fn same_day_blocks(date: NaiveDate, policy: &ServicePolicy, now: DateTime<Utc>) -> Vec<Interval> {
    if now.date_naive() != date {
        return Vec::new();
    }
    let day = Interval::for_day(date);
    let mut blocks = Vec::new();

    // Blocks from midnight up to the cutoff, as stored policies expect.
    if let Some(cutoff) = policy.same_day_cutoff {
        blocks.push(Interval::new(day.start, cutoff.on(date)));
    }

    if policy.min_lead_min > 0 {
        let earliest = now
            .checked_add_signed(Duration::minutes(i64::from(policy.min_lead_min)))
            .map_or(day.end, ceil_to_minute);
        blocks.push(Interval::new(day.start, earliest.min(day.end)));
    }

    blocks
}

fn floor_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(Duration::minutes(1)).unwrap_or(t)
}

fn ceil_to_minute(t: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = floor_to_minute(t);
    if truncated < t {
        truncated
            .checked_add_signed(Duration::minutes(1))
            .unwrap_or(truncated)
    } else {
        truncated
    }
}

/// `iv` shrunk by the buffers and narrowed to whole minutes, or `None` when
/// nothing is left. Every slot then starts exactly on its `"HH:MM"` label.
fn bookable_span(iv: &Interval, before: Duration, after: Duration) -> Option<Interval> {
    let start = ceil_to_minute(iv.start.checked_add_signed(before)?);
    let end = floor_to_minute(iv.end.checked_sub_signed(after)?);
    (start < end).then(|| Interval::new(start, end))
}

/// Bookable slots on `date`, ascending and deduplicated.
///
/// Pure: operates on already-fetched records and an explicit `now`. An empty
/// result means the day has no room for the service.
///
/// # Errors
/// [`EngineError::InvalidInput`] for a zero-length service, a zero grid step
/// or a date whose end is not representable.
pub fn available_slots(
    date: NaiveDate,
    records: &DayRecords<'_>,
    policy: &ServicePolicy,
    now: DateTime<Utc>,
    step_minutes: u32,
) -> Result<Vec<Slot>> {
    policy.validate()?;
    if step_minutes == 0 {
        return Err(EngineError::InvalidInput(
            "slot step must be at least one minute".to_owned(),
        ));
    }
    let day = representable_day(date)?;
    let open = open_intervals(date, records);

    let mut blocks: Vec<Interval> = records
        .exceptions
        .iter()
        .map(Exception::interval)
        .chain(
            records
                .reservations
                .iter()
                .filter(|r| r.status.blocks_time())
                .map(Reservation::interval),
        )
        .filter_map(|iv| iv.clip(&day))
        .collect();
    blocks.extend(same_day_blocks(date, policy, now));

    let available = subtract(&open, &merge(&blocks));

    let duration = Duration::minutes(i64::from(policy.default_duration));
    let before = Duration::minutes(i64::from(policy.buffer_before));
    let after = Duration::minutes(i64::from(policy.buffer_after));
    let step = Duration::minutes(i64::from(step_minutes));

    let mut slots = Vec::new();
    for span in available
        .iter()
        .filter_map(|iv| bookable_span(iv, before, after))
    {
        let mut t = span.start;
        while let Some(end) = t.checked_add_signed(duration).filter(|e| *e <= span.end) {
            slots.push(Slot {
                time: TimeOfDay::of_instant(t, date),
                start: t,
                end,
            });
            match t.checked_add_signed(step) {
                Some(next) => t = next,
                None => break,
            }
        }
    }

    slots.sort();
    slots.dedup_by_key(|s| s.time);

    tracing::debug!(%date, open = open.len(), slots = slots.len(), "resolved slots");
    Ok(slots)
}

/// Fetch one day's records from `source` and resolve its bookable slots.
///
/// `service` selects the policy; when `None`, the resource's first active
/// service is used, falling back to [`DEFAULT_POLICY`](crate::policy::DEFAULT_POLICY).
///
/// # Errors
/// - [`EngineError::InvalidInput`] for a blank resource id, an invalid config,
///   a zero-length service or a date whose end is not representable.
/// - [`EngineError::Source`] when the source fails.
pub fn find_available_slots<S: AvailabilitySource + ?Sized>(
    source: &S,
    resource_id: &str,
    date: NaiveDate,
    service: Option<&ServicePolicy>,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<Vec<Slot>> {
    require_resource_id(resource_id)?;
    config.validate()?;

    let policy = match service {
        Some(policy) => policy.clone(),
        None => resolve_policy(None, &source.services(resource_id)?),
    };
    policy.validate()?;

    let day = representable_day(date)?;
    let rules = source.weekly_rules(resource_id)?;
    let windows = source.dated_windows(resource_id, date, date)?;
    let exceptions = source.exceptions(resource_id, day.start, day.end)?;
    let reservations = source.reservations(resource_id, day.start, day.end)?;

    let records = DayRecords {
        rules: &rules,
        windows: &windows,
        exceptions: &exceptions,
        reservations: &reservations,
    };
    available_slots(date, &records, &policy, now, config.slot_step_minutes)
}

/// Whether `start` on `date` is one of the slots the resolver would offer.
///
/// Meant for a booking step re-validating a requested time against a fresh
/// snapshot right before it writes the reservation.
pub fn is_slot_bookable<S: AvailabilitySource + ?Sized>(
    source: &S,
    resource_id: &str,
    date: NaiveDate,
    start: TimeOfDay,
    service: Option<&ServicePolicy>,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<bool> {
    let slots = find_available_slots(source, resource_id, date, service, now, config)?;
    Ok(slots.binary_search_by_key(&start, |s| s.time).is_ok())
}
