//! Data contracts consumed by the resolvers.
//!
//! Every type here is a read-only snapshot supplied by the storage layer.
//! Field names serialize as camelCase, times of day as `"HH:MM"`, instants
//! as RFC 3339 and dates as `YYYY-MM-DD`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::MalformedRecord;
use crate::interval::Interval;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// A UTC time of day with minute precision, `00:00` through `24:00`.
///
/// `24:00` is the next midnight and is only meaningful as an end time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid time of day '{0}', expected HH:MM between 00:00 and 24:00")]
pub struct ParseTimeError(String);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);
    pub const END_OF_DAY: TimeOfDay = TimeOfDay(MINUTES_PER_DAY);

    /// Build from hours and minutes; `None` past `24:00`.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if minute >= 60 {
            return None;
        }
        Self::from_minutes(hour.checked_mul(60)?.checked_add(minute)?)
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        u16::try_from(minutes)
            .ok()
            .filter(|m| *m <= MINUTES_PER_DAY)
            .map(TimeOfDay)
    }

    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }

    /// The instant this time of day falls on for `date`.
    ///
    /// Saturates at `DateTime::<Utc>::MAX_UTC` on the last representable day.
    pub fn on(self, date: NaiveDate) -> DateTime<Utc> {
        Interval::for_day(date)
            .start
            .checked_add_signed(Duration::minutes(i64::from(self.0)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// The time of day of `instant` within `date`, truncated to the minute.
    ///
    /// Instants before the day clamp to `00:00`, after it to `24:00`.
    pub fn of_instant(instant: DateTime<Utc>, date: NaiveDate) -> Self {
        let minutes = (instant - Interval::for_day(date).start)
            .num_minutes()
            .clamp(0, i64::from(MINUTES_PER_DAY));
        TimeOfDay(minutes as u16)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimeError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(err());
        }
        let hour: u32 = h.parse().map_err(|_| err())?;
        let minute: u32 = m.parse().map_err(|_| err())?;
        TimeOfDay::from_hm(hour, minute).ok_or_else(err)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ParseTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

/// Weekday number used by stored rules: 0 = Sunday .. 6 = Saturday.
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Recurring open hours for one weekday, optionally bounded by validity dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRule {
    pub resource_id: String,
    /// 0 = Sunday .. 6 = Saturday.
    pub weekday: u8,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
}

impl WeeklyRule {
    pub fn validate(&self) -> Result<(), MalformedRecord> {
        let malformed = |detail: String| MalformedRecord {
            kind: "weekly rule",
            resource_id: self.resource_id.clone(),
            detail,
        };
        if self.weekday > 6 {
            return Err(malformed(format!("weekday {} out of range 0..=6", self.weekday)));
        }
        if self.start_time >= self.end_time {
            return Err(malformed(format!(
                "start {} is not before end {}",
                self.start_time, self.end_time
            )));
        }
        Ok(())
    }

    /// Whether `date` lies within the rule's optional validity bounds (inclusive).
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.valid_from.is_none_or(|from| date >= from)
            && self.valid_to.is_none_or(|to| date <= to)
    }

    /// Weekday matches and `date` is within validity bounds.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.weekday == weekday_number(date) && self.is_valid_on(date)
    }

    /// The rule's hours placed on `date`.
    pub fn interval_on(&self, date: NaiveDate) -> Interval {
        Interval::new(self.start_time.on(date), self.end_time.on(date))
    }
}

/// One-off open hours replacing every weekly rule on its date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatedWindow {
    pub resource_id: String,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DatedWindow {
    pub fn validate(&self) -> Result<(), MalformedRecord> {
        if self.start_time >= self.end_time {
            return Err(MalformedRecord {
                kind: "dated window",
                resource_id: self.resource_id.clone(),
                detail: format!(
                    "{}: start {} is not before end {}",
                    self.date, self.start_time, self.end_time
                ),
            });
        }
        Ok(())
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start_time.on(self.date), self.end_time.on(self.date))
    }
}

/// An absolute blackout, subtracted from open time whatever its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exception {
    pub resource_id: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Exception {
    pub fn interval(&self) -> Interval {
        Interval::new(self.start_at, self.end_at)
    }

    /// The whole UTC days in `[from, to]` this exception blacks out.
    ///
    /// Only an exception that starts and ends exactly on UTC midnight (at
    /// least one day apart) counts; anything else is partial and yields
    /// nothing. Days outside the range are never materialized.
    pub fn full_days_within(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let start = self.start_at.date_naive();
        let end = self.end_at.date_naive();
        let on_midnight = |t: DateTime<Utc>| t == Interval::for_day(t.date_naive()).start;
        if !on_midnight(self.start_at) || !on_midnight(self.end_at) || end <= start {
            return Vec::new();
        }
        start
            .max(from)
            .iter_days()
            .take_while(|d| *d < end && *d <= to)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Denied,
    Completed,
    NoShow,
}

impl ReservationStatus {
    /// Only pending and confirmed reservations occupy time.
    pub fn blocks_time(self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }
}

/// An existing booking on the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub resource_id: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn interval(&self) -> Interval {
        Interval::new(self.start_at, self.end_at)
    }
}

/// How raw open time becomes bookable slots for one kind of appointment.
///
/// All durations are in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePolicy {
    pub default_duration: u32,
    #[serde(default)]
    pub buffer_before: u32,
    #[serde(default)]
    pub buffer_after: u32,
    #[serde(default)]
    pub min_lead_min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_day_cutoff: Option<TimeOfDay>,
}

/// Policy used when neither an explicit service nor an active one exists.
pub const DEFAULT_POLICY: ServicePolicy = ServicePolicy {
    default_duration: 60,
    buffer_before: 0,
    buffer_after: 0,
    min_lead_min: 0,
    same_day_cutoff: None,
};

impl Default for ServicePolicy {
    fn default() -> Self {
        DEFAULT_POLICY
    }
}

impl ServicePolicy {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.default_duration == 0 {
            return Err(crate::error::EngineError::InvalidInput(
                "service duration must be at least one minute".to_string(),
            ));
        }
        Ok(())
    }
}

/// A bookable service configured for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub resource_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(flatten)]
    pub policy: ServicePolicy,
}

fn default_active() -> bool {
    true
}

/// Pick the policy a slot computation runs with.
///
/// An explicit policy wins; otherwise the first active service's policy is
/// used; otherwise [`DEFAULT_POLICY`].
pub fn resolve_policy(explicit: Option<&ServicePolicy>, services: &[Service]) -> ServicePolicy {
    explicit
        .or_else(|| services.iter().find(|s| s.active).map(|s| &s.policy))
        .cloned()
        .unwrap_or(DEFAULT_POLICY)
}
