//! Tests for single-day slot resolution.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use slot_engine::{
    available_slots, find_available_slots, is_slot_bookable, DatedWindow, DayRecords,
    EngineConfig, EngineError, Exception, Reservation, ReservationStatus, Service, ServicePolicy,
    Slot, Snapshot, TimeOfDay, WeeklyRule, DEFAULT_POLICY,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

const RESOURCE: &str = "stylist-7";

/// 2026-03-02, a Monday.
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

/// An instant on a day well before 2026-03-02 so same-day rules stay off.
fn long_ago() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
}

fn rule(weekday: u8, start: &str, end: &str) -> WeeklyRule {
    WeeklyRule {
        resource_id: RESOURCE.to_string(),
        weekday,
        start_time: start.parse().unwrap(),
        end_time: end.parse().unwrap(),
        valid_from: None,
        valid_to: None,
    }
}

fn window(start: &str, end: &str) -> DatedWindow {
    DatedWindow {
        resource_id: RESOURCE.to_string(),
        date: monday(),
        start_time: start.parse().unwrap(),
        end_time: end.parse().unwrap(),
        note: None,
    }
}

fn reservation(start: DateTime<Utc>, end: DateTime<Utc>, status: ReservationStatus) -> Reservation {
    Reservation {
        resource_id: RESOURCE.to_string(),
        start_at: start,
        end_at: end,
        status,
    }
}

fn policy(duration: u32) -> ServicePolicy {
    ServicePolicy {
        default_duration: duration,
        ..DEFAULT_POLICY
    }
}

fn labels(slots: &[Slot]) -> Vec<String> {
    slots.iter().map(|s| s.to_string()).collect()
}

/// Every grid time from `from` to `to` inclusive, 15 minutes apart.
fn grid(from: &str, to: &str) -> Vec<String> {
    let from: TimeOfDay = from.parse().unwrap();
    let to: TimeOfDay = to.parse().unwrap();
    (from.minutes()..=to.minutes())
        .step_by(15)
        .map(|m| TimeOfDay::from_minutes(m).unwrap().to_string())
        .collect()
}

fn resolve(records: DayRecords<'_>, policy: &ServicePolicy, now: DateTime<Utc>) -> Vec<String> {
    labels(&available_slots(monday(), &records, policy, now, 15).unwrap())
}

// ── Open time ───────────────────────────────────────────────────────────────

#[test]
fn weekly_rule_yields_grid_of_slots() {
    let rules = vec![rule(1, "09:00", "11:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    // 60-minute service in 09:00-11:00: 09:00 .. 10:00.
    assert_eq!(resolve(records, &policy(60), long_ago()), grid("09:00", "10:00"));
}

#[test]
fn rules_for_other_weekdays_are_ignored() {
    let rules = vec![rule(2, "09:00", "17:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    assert!(resolve(records, &policy(60), long_ago()).is_empty());
}

#[test]
fn split_shift_rules_are_merged() {
    // 09:00-10:00 and 10:00-11:00 touch, so a 90-minute service fits.
    let rules = vec![rule(1, "10:00", "11:00"), rule(1, "09:00", "10:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    assert_eq!(resolve(records, &policy(90), long_ago()), vec!["09:00", "09:15", "09:30"]);
}

#[test]
fn expired_rule_contributes_nothing() {
    let mut expired = rule(1, "09:00", "17:00");
    expired.valid_to = Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    let current = rule(1, "13:00", "14:00");
    let rules = vec![expired, current];
    let records = DayRecords { rules: &rules, ..Default::default() };
    assert_eq!(resolve(records, &policy(60), long_ago()), vec!["13:00"]);
}

#[test]
fn dated_window_replaces_weekly_rules() {
    // Window hours are disjoint from rule hours; only window slots may appear.
    let rules = vec![rule(1, "09:00", "12:00")];
    let windows = vec![window("14:00", "16:00")];
    let records = DayRecords { rules: &rules, windows: &windows, ..Default::default() };
    assert_eq!(resolve(records, &policy(60), long_ago()), grid("14:00", "15:00"));
}

#[test]
fn overlapping_dated_windows_are_merged() {
    let windows = vec![window("10:00", "11:00"), window("10:30", "12:00")];
    let records = DayRecords { windows: &windows, ..Default::default() };
    assert_eq!(resolve(records, &policy(120), long_ago()), vec!["10:00"]);
}

#[test]
fn window_until_midnight_reaches_end_of_day() {
    let windows = vec![window("23:00", "24:00")];
    let records = DayRecords { windows: &windows, ..Default::default() };
    assert_eq!(resolve(records, &policy(30), long_ago()), vec!["23:00", "23:15", "23:30"]);
}

#[test]
fn malformed_rule_is_skipped_not_fatal() {
    let rules = vec![rule(1, "12:00", "10:00"), rule(1, "09:00", "10:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    assert_eq!(resolve(records, &policy(60), long_ago()), vec!["09:00"]);
}

// ── Blocks ──────────────────────────────────────────────────────────────────

#[test]
fn confirmed_reservation_excludes_overlapping_starts() {
    let rules = vec![rule(1, "09:00", "17:00")];
    let reservations = vec![reservation(at(10, 0), at(11, 0), ReservationStatus::Confirmed)];
    let records = DayRecords {
        rules: &rules,
        reservations: &reservations,
        ..Default::default()
    };
    let slots = resolve(records, &policy(60), long_ago());

    // 09:00 ends exactly when the reservation starts; 11:00 starts when it ends.
    let mut expected = vec!["09:00".to_string()];
    expected.extend(grid("11:00", "16:00"));
    assert_eq!(slots, expected);
    assert!(!slots.contains(&"10:00".to_string()));
}

#[test]
fn cancelled_and_denied_reservations_do_not_block() {
    let rules = vec![rule(1, "09:00", "10:00")];
    let reservations = vec![
        reservation(at(9, 0), at(10, 0), ReservationStatus::Cancelled),
        reservation(at(9, 0), at(10, 0), ReservationStatus::Denied),
    ];
    let records = DayRecords {
        rules: &rules,
        reservations: &reservations,
        ..Default::default()
    };
    assert_eq!(resolve(records, &policy(60), long_ago()), vec!["09:00"]);
}

#[test]
fn pending_reservation_blocks() {
    let rules = vec![rule(1, "09:00", "10:00")];
    let reservations = vec![reservation(at(9, 30), at(9, 45), ReservationStatus::Pending)];
    let records = DayRecords {
        rules: &rules,
        reservations: &reservations,
        ..Default::default()
    };
    assert_eq!(resolve(records, &policy(15), long_ago()), vec!["09:00", "09:15", "09:45"]);
}

#[test]
fn exception_blocks_window_hours_too() {
    let windows = vec![window("09:00", "12:00")];
    let exceptions = vec![Exception {
        resource_id: RESOURCE.to_string(),
        start_at: at(9, 0),
        end_at: at(11, 0),
        reason: Some("training".to_string()),
    }];
    let records = DayRecords {
        windows: &windows,
        exceptions: &exceptions,
        ..Default::default()
    };
    assert_eq!(resolve(records, &policy(60), long_ago()), vec!["11:00"]);
}

#[test]
fn day_covered_by_exception_is_empty_not_error() {
    let rules = vec![rule(1, "09:00", "17:00")];
    let exceptions = vec![Exception {
        resource_id: RESOURCE.to_string(),
        start_at: Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap(),
        end_at: Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap(),
        reason: None,
    }];
    let records = DayRecords {
        rules: &rules,
        exceptions: &exceptions,
        ..Default::default()
    };
    assert!(resolve(records, &policy(30), long_ago()).is_empty());
}

// ── Service policy ──────────────────────────────────────────────────────────

#[test]
fn buffers_shrink_interval_on_both_sides() {
    // Open 09:00-10:00, buffers of 15 leave 09:15-09:45; 30 minutes fits once.
    let rules = vec![rule(1, "09:00", "10:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    let policy = ServicePolicy {
        default_duration: 30,
        buffer_before: 15,
        buffer_after: 15,
        ..DEFAULT_POLICY
    };
    let slots = available_slots(monday(), &records, &policy, long_ago(), 15).unwrap();
    assert_eq!(labels(&slots), vec!["09:15"]);
    assert_eq!(slots[0].start, at(9, 15));
    assert_eq!(slots[0].end, at(9, 45));
}

#[test]
fn buffers_larger_than_interval_leave_nothing() {
    let rules = vec![rule(1, "09:00", "10:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    let policy = ServicePolicy {
        default_duration: 31,
        buffer_before: 15,
        buffer_after: 15,
        ..DEFAULT_POLICY
    };
    assert!(resolve(records, &policy, long_ago()).is_empty());
}

#[test]
fn lead_time_hides_early_slots_today() {
    let rules = vec![rule(1, "08:00", "17:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    let policy = ServicePolicy {
        default_duration: 60,
        min_lead_min: 120,
        ..DEFAULT_POLICY
    };
    let slots = resolve(records, &policy, at(9, 0));
    assert_eq!(slots, grid("11:00", "16:00"));
}

#[test]
fn lead_time_rounds_up_to_whole_minute() {
    let rules = vec![rule(1, "09:00", "12:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    let policy = ServicePolicy {
        default_duration: 60,
        min_lead_min: 60,
        ..DEFAULT_POLICY
    };
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 30).unwrap();
    // Earliest start is 10:00:30, rounded up to 10:01; the grid restarts there.
    assert_eq!(
        resolve(records, &policy, now),
        vec!["10:01", "10:16", "10:31", "10:46"]
    );
}

#[test]
fn lead_time_ignored_on_other_days() {
    let rules = vec![rule(1, "09:00", "10:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    let policy = ServicePolicy {
        default_duration: 60,
        min_lead_min: 600,
        ..DEFAULT_POLICY
    };
    let sunday_evening = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
    assert_eq!(resolve(records, &policy, sunday_evening), vec!["09:00"]);
}

#[test]
fn same_day_cutoff_blocks_morning_until_cutoff() {
    let rules = vec![rule(1, "09:00", "14:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    let policy = ServicePolicy {
        default_duration: 60,
        same_day_cutoff: Some("12:00".parse().unwrap()),
        ..DEFAULT_POLICY
    };
    assert_eq!(resolve(records, &policy, at(7, 0)), grid("12:00", "13:00"));
    // Not today: the cutoff has no effect.
    assert_eq!(resolve(records, &policy, long_ago()), grid("09:00", "13:00"));
}

#[test]
fn custom_grid_step() {
    let rules = vec![rule(1, "09:00", "10:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    let slots = available_slots(monday(), &records, &policy(30), long_ago(), 10).unwrap();
    assert_eq!(labels(&slots), vec!["09:00", "09:10", "09:20", "09:30"]);
}

#[test]
fn sub_minute_boundaries_keep_labels_inside_free_time() {
    let rules = vec![rule(1, "09:00", "12:00")];
    let reservation_end = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 30).unwrap();
    let exception_start = Utc.with_ymd_and_hms(2026, 3, 2, 11, 30, 45).unwrap();
    let reservations = vec![reservation(at(9, 0), reservation_end, ReservationStatus::Confirmed)];
    let exceptions = vec![Exception {
        resource_id: RESOURCE.to_string(),
        start_at: exception_start,
        end_at: at(12, 0),
        reason: None,
    }];
    let records = DayRecords {
        rules: &rules,
        exceptions: &exceptions,
        reservations: &reservations,
        ..Default::default()
    };
    let slots = available_slots(monday(), &records, &policy(30), long_ago(), 15).unwrap();
    // Free time is 10:00:30-11:30:45; whole minutes 10:01-11:30.
    assert_eq!(labels(&slots), vec!["10:01", "10:16", "10:31", "10:46"]);
    for slot in &slots {
        assert!(slot.start >= reservation_end, "{slot} starts inside the reservation");
        assert!(slot.end <= exception_start, "{slot} runs into the exception");
        assert_eq!(slot.start, slot.time.on(monday()));
    }
}

#[test]
fn zero_step_is_rejected() {
    let rules = vec![rule(1, "09:00", "10:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    let err = available_slots(monday(), &records, &policy(30), long_ago(), 0).unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)), "{err}");
}

#[test]
fn zero_duration_is_rejected() {
    let rules = vec![rule(1, "09:00", "24:00")];
    let records = DayRecords { rules: &rules, ..Default::default() };
    let err = available_slots(monday(), &records, &policy(0), long_ago(), 15).unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)), "{err}");
}

#[test]
fn repeated_calls_are_identical() {
    let rules = vec![rule(1, "09:00", "17:00"), rule(1, "12:00", "18:00")];
    let reservations = vec![reservation(at(13, 0), at(14, 30), ReservationStatus::Confirmed)];
    let records = DayRecords {
        rules: &rules,
        reservations: &reservations,
        ..Default::default()
    };
    let first = available_slots(monday(), &records, &policy(45), long_ago(), 15).unwrap();
    let second = available_slots(monday(), &records, &policy(45), long_ago(), 15).unwrap();
    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0].time < w[1].time));
}

// ── find_available_slots over a source ──────────────────────────────────────

fn service(id: &str, active: bool, duration: u32) -> Service {
    Service {
        id: id.to_string(),
        resource_id: RESOURCE.to_string(),
        name: id.to_string(),
        active,
        policy: policy(duration),
    }
}

fn snapshot() -> Snapshot {
    Snapshot {
        weekly_rules: vec![rule(1, "09:00", "11:00")],
        reservations: vec![reservation(at(10, 0), at(10, 30), ReservationStatus::Confirmed)],
        services: vec![service("retired", false, 15), service("cut", true, 30)],
        ..Snapshot::default()
    }
}

#[test]
fn falls_back_to_first_active_service() {
    let slots =
        find_available_slots(&snapshot(), RESOURCE, monday(), None, long_ago(), &EngineConfig::default())
            .unwrap();
    // 30-minute "cut" service, reservation 10:00-10:30.
    assert_eq!(labels(&slots), vec!["09:00", "09:15", "09:30", "10:30"]);
}

#[test]
fn falls_back_to_default_policy_without_services() {
    let snapshot = Snapshot {
        services: vec![],
        reservations: vec![],
        ..snapshot()
    };
    let slots =
        find_available_slots(&snapshot, RESOURCE, monday(), None, long_ago(), &EngineConfig::default())
            .unwrap();
    // DEFAULT_POLICY is 60 minutes.
    assert_eq!(labels(&slots), vec!["09:00", "09:15", "09:30", "09:45", "10:00"]);
}

#[test]
fn explicit_policy_wins_over_services() {
    let explicit = policy(120);
    let snapshot = Snapshot {
        reservations: vec![],
        ..snapshot()
    };
    let slots = find_available_slots(
        &snapshot,
        RESOURCE,
        monday(),
        Some(&explicit),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(labels(&slots), vec!["09:00"]);
}

#[test]
fn zero_duration_policy_is_rejected() {
    let err = find_available_slots(
        &snapshot(),
        RESOURCE,
        monday(),
        Some(&policy(0)),
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)), "{err}");
}

#[test]
fn zero_step_config_is_rejected() {
    let config = EngineConfig {
        slot_step_minutes: 0,
        ..EngineConfig::default()
    };
    let err = find_available_slots(&snapshot(), RESOURCE, monday(), None, long_ago(), &config)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)), "{err}");
}

#[test]
fn other_resources_do_not_leak_in() {
    let mut foreign = reservation(at(9, 0), at(11, 0), ReservationStatus::Confirmed);
    foreign.resource_id = "stylist-8".to_string();
    let mut snapshot = snapshot();
    snapshot.reservations.push(foreign);
    let slots =
        find_available_slots(&snapshot, RESOURCE, monday(), None, long_ago(), &EngineConfig::default())
            .unwrap();
    assert_eq!(slots.len(), 4);
}

#[test]
fn slot_bookable_check_matches_resolver() {
    let config = EngineConfig::default();
    let bookable = |time: &str| {
        is_slot_bookable(
            &snapshot(),
            RESOURCE,
            monday(),
            time.parse().unwrap(),
            None,
            long_ago(),
            &config,
        )
        .unwrap()
    };
    assert!(bookable("09:30"));
    assert!(bookable("10:30"));
    assert!(!bookable("09:45"));
    assert!(!bookable("10:00"));
}

#[test]
fn slot_bookable_rejects_label_overlapping_sub_minute_reservation() {
    let snapshot = Snapshot {
        reservations: vec![reservation(
            at(9, 0),
            Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 30).unwrap(),
            ReservationStatus::Confirmed,
        )],
        ..snapshot()
    };
    let half_hour = policy(30);
    let bookable = |time: &str| {
        is_slot_bookable(
            &snapshot,
            RESOURCE,
            monday(),
            time.parse().unwrap(),
            Some(&half_hour),
            long_ago(),
            &EngineConfig::default(),
        )
        .unwrap()
    };
    // Free from 10:00:30 to 11:00: "10:00" would start inside the reservation.
    assert!(!bookable("10:00"));
    assert!(bookable("10:01"));
    assert!(bookable("10:16"));
    assert!(!bookable("10:31"));
}

#[test]
fn last_representable_day_is_an_error() {
    let err = find_available_slots(
        &Snapshot::default(),
        RESOURCE,
        NaiveDate::MAX,
        None,
        long_ago(),
        &EngineConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)), "{err}");

    let err = available_slots(NaiveDate::MAX, &DayRecords::default(), &DEFAULT_POLICY, long_ago(), 15)
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)), "{err}");
}

#[test]
fn slots_serialize_as_labels() {
    let snapshot = snapshot();
    let slots =
        find_available_slots(&snapshot, RESOURCE, monday(), None, long_ago(), &EngineConfig::default())
            .unwrap();
    let json = serde_json::to_string(&slots).unwrap();
    assert_eq!(json, r#"["09:00","09:15","09:30","10:30"]"#);
}
