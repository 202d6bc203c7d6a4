// libs/booking-cell/tests/rule_resolution_test.rs
//
// Precedence tests for the pure rule-resolution stage: override rules
// replace regular weekday rules, and a blocked override absorbs the day.

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use booking_cell::models::{AvailabilityRule, BookingService, RuleScope, RuleWindow};
use booking_cell::services::rules::{choose_rules, filter_for_service, DayAvailability};

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn weekly_rule(weekday: u8, start: NaiveTime, end: NaiveTime) -> AvailabilityRule {
    AvailabilityRule {
        id: Uuid::new_v4(),
        preparer_id: Uuid::new_v4(),
        scope: RuleScope::Weekly { weekday },
        window: RuleWindow::Open { start, end },
        service_ids: None,
        active: true,
    }
}

fn override_rule(from: NaiveDate, to: NaiveDate, window: RuleWindow) -> AvailabilityRule {
    AvailabilityRule {
        id: Uuid::new_v4(),
        preparer_id: Uuid::new_v4(),
        scope: RuleScope::DateRange { from, to },
        window,
        service_ids: None,
        active: true,
    }
}

// 2025-06-16 is a Monday (weekday index 1 with Sunday = 0).
fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
}

#[test]
fn regular_rule_applies_on_its_weekday_only() {
    let rules = vec![weekly_rule(1, time(9, 0), time(17, 0))];

    match choose_rules(rules.clone(), monday()) {
        DayAvailability::Open(chosen) => assert_eq!(chosen.len(), 1),
        other => panic!("expected open day, got {:?}", other),
    }

    // Tuesday: the Monday rule must not apply.
    let tuesday = monday().succ_opt().unwrap();
    assert_eq!(choose_rules(rules, tuesday), DayAvailability::Open(vec![]));
}

#[test]
fn override_replaces_regular_rules_for_its_dates() {
    let regular = weekly_rule(1, time(9, 0), time(17, 0));
    let special = override_rule(
        monday(),
        monday(),
        RuleWindow::Open {
            start: time(12, 0),
            end: time(15, 0),
        },
    );
    let special_id = special.id;

    match choose_rules(vec![regular, special], monday()) {
        DayAvailability::Open(chosen) => {
            assert_eq!(chosen.len(), 1);
            assert_eq!(chosen[0].id, special_id);
        }
        other => panic!("expected open day, got {:?}", other),
    }
}

#[test]
fn blocked_override_absorbs_the_whole_day() {
    let regular = weekly_rule(1, time(9, 0), time(17, 0));
    let vacation = override_rule(
        NaiveDate::from_ymd_opt(2025, 6, 9).unwrap(),
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(),
        RuleWindow::Blocked,
    );
    // A second, open override on the same date cannot resurrect the day.
    let open_override = override_rule(
        monday(),
        monday(),
        RuleWindow::Open {
            start: time(10, 0),
            end: time(12, 0),
        },
    );

    assert_eq!(
        choose_rules(vec![regular, open_override, vacation], monday()),
        DayAvailability::Unavailable
    );
}

#[test]
fn blocked_override_outside_its_range_is_ignored() {
    let regular = weekly_rule(1, time(9, 0), time(17, 0));
    let vacation = override_rule(
        NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 7, 14).unwrap(),
        RuleWindow::Blocked,
    );

    match choose_rules(vec![regular, vacation], monday()) {
        DayAvailability::Open(chosen) => assert_eq!(chosen.len(), 1),
        other => panic!("expected open day, got {:?}", other),
    }
}

#[test]
fn inactive_rules_never_apply() {
    let mut rule = weekly_rule(1, time(9, 0), time(17, 0));
    rule.active = false;

    assert_eq!(
        choose_rules(vec![rule], monday()),
        DayAvailability::Open(vec![])
    );
}

#[test]
fn service_filter_keeps_unrestricted_and_matching_rules() {
    let service_id = Uuid::new_v4();
    let other_service = Uuid::new_v4();

    let unrestricted = weekly_rule(1, time(9, 0), time(12, 0));
    let mut matching = weekly_rule(1, time(13, 0), time(17, 0));
    matching.service_ids = Some(vec![service_id]);
    let mut excluded = weekly_rule(1, time(17, 0), time(19, 0));
    excluded.service_ids = Some(vec![other_service]);

    let kept = filter_for_service(
        vec![unrestricted.clone(), matching.clone(), excluded],
        Some(service_id),
        None,
    );

    let kept_ids: Vec<_> = kept.iter().map(|r| r.id).collect();
    assert_eq!(kept_ids, vec![unrestricted.id, matching.id]);
}

#[test]
fn service_side_rule_restriction_narrows_the_set() {
    let service_id = Uuid::new_v4();
    let first = weekly_rule(1, time(9, 0), time(12, 0));
    let second = weekly_rule(1, time(13, 0), time(17, 0));

    let service = BookingService {
        id: service_id,
        name: "1040 review".to_string(),
        buffer_after_minutes: 15,
        allowed_rule_ids: Some(vec![second.id]),
    };

    let kept = filter_for_service(
        vec![first, second.clone()],
        Some(service_id),
        Some(&service),
    );

    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].id, second.id);
}

#[test]
fn no_service_requested_keeps_every_rule() {
    let unrestricted = weekly_rule(1, time(9, 0), time(12, 0));
    let mut restricted = weekly_rule(1, time(13, 0), time(17, 0));
    restricted.service_ids = Some(vec![Uuid::new_v4()]);

    let kept = filter_for_service(vec![unrestricted, restricted], None, None);
    assert_eq!(kept.len(), 2);
}
