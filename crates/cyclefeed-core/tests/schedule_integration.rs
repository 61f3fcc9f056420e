//! Integration tests for schedule building and item placement.

use chrono::{Duration, NaiveDate};
use cyclefeed_core::{
    add_items_to_schedule, assign_to_period, build_schedule, place_item,
    resolve_effective_instant, Cycle, ItemLocation, Program, Schedule, ScheduleError,
    ScheduleItem, ScheduleMode,
};
use proptest::prelude::*;

fn program(count: u32, length: u32) -> Program {
    Program {
        id: "prog".to_string(),
        period_count: count,
        period_length: length,
        period_name: "Period".to_string(),
    }
}

fn cycle(pre_sale_days: u32, post_season_days: u32) -> Cycle {
    Cycle {
        id: "cycle".to_string(),
        period_one_start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        schedule_on_sale_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        schedule_on_sale_end: None,
        schedule_on_sale_pre_sale_days: pre_sale_days,
        schedule_on_sale_post_sale_days: 0,
        post_season_days,
        meal_period_early_access_days: 0,
        period_info: vec![],
    }
}

fn occurrences(schedule: &Schedule, id: &str) -> usize {
    schedule.items().filter(|i| i.id == id).count()
}

#[test]
fn test_five_week_program_calendar() {
    let schedule = build_schedule(&program(5, 7), &cycle(7, 5));
    assert_eq!(schedule.periods.len(), 7);

    let summary: Vec<_> = schedule
        .periods
        .iter()
        .map(|p| (p.index, p.name.as_str(), p.start.to_string(), p.end.to_string()))
        .collect();

    assert_eq!(
        summary[0],
        (-1, "Pre Season", "2019-12-25 00:00:00".to_string(), "2019-12-31 23:59:59".to_string())
    );
    assert_eq!(
        summary[1],
        (0, "Period 1", "2020-01-01 00:00:00".to_string(), "2020-01-07 23:59:59".to_string())
    );
    assert_eq!(
        summary[5],
        (4, "Period 5", "2020-01-29 00:00:00".to_string(), "2020-02-04 23:59:59".to_string())
    );
    assert_eq!(
        summary[6],
        (5, "Post Season", "2020-02-05 00:00:00".to_string(), "2020-02-10 23:59:59".to_string())
    );
}

#[test]
fn test_period_relative_item_resolves_to_local_time() {
    let schedule = build_schedule(&program(5, 7), &cycle(7, 5));
    let mut item = ScheduleItem::relative_to_period("recipe", 0, 2, "14:00:00");
    let instant = resolve_effective_instant(&schedule, &mut item).unwrap().unwrap();
    assert_eq!(schedule.to_local(instant).to_string(), "2020-01-03 14:00:00");
}

#[test]
fn test_unknown_period_is_rejected() {
    let schedule = build_schedule(&program(5, 7), &cycle(7, 5));
    let mut item = ScheduleItem::relative_to_period("recipe", 20, 0, "09:00");
    let err = resolve_effective_instant(&schedule, &mut item).unwrap_err();
    assert_eq!(
        err,
        ScheduleError::PeriodNotFound {
            item_id: "recipe".to_string(),
            period_index: 20,
        }
    );
}

#[test]
fn test_out_of_range_day_offset_aborts_bulk_load() {
    let mut schedule = build_schedule(&program(5, 7), &cycle(7, 5));
    let err = add_items_to_schedule(
        &mut schedule,
        vec![
            ScheduleItem::relative_to_period("ok", 0, 0, "08:00"),
            ScheduleItem::relative_to_period("huge", 0, i32::MAX, "10:00"),
        ],
    )
    .unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidScheduleFields { ref item_id, .. } if item_id == "huge"));
    assert_eq!(schedule.items().count(), 0);
}

#[test]
fn test_bulk_load_then_edit_workflow() {
    let mut schedule = build_schedule(&program(5, 7), &cycle(7, 5));
    add_items_to_schedule(
        &mut schedule,
        vec![
            ScheduleItem::relative_to_period("a", 0, 0, "08:00"),
            ScheduleItem::relative_to_period("b", 0, 0, "12:00"),
            ScheduleItem::at("c", ScheduleMode::Global, "2019-12-27", "10:00"),
            ScheduleItem::at("d", ScheduleMode::Timezone, "2020-02-07", "18:30"),
            ScheduleItem::new("e"),
        ],
    )
    .unwrap();

    assert_eq!(schedule.period(0).unwrap().days.len(), 1);
    assert_eq!(schedule.period(0).unwrap().days[0].items.len(), 2);
    assert_eq!(
        schedule.locate("c"),
        Some(ItemLocation::Day {
            period_index: -1,
            day_key: "2019-12-27".to_string(),
        })
    );
    assert_eq!(
        schedule.locate("d"),
        Some(ItemLocation::Day {
            period_index: 5,
            day_key: "2020-02-07".to_string(),
        })
    );
    assert_eq!(schedule.locate("e"), Some(ItemLocation::Unscheduled));

    // Edit "a" to a later period: the original day keeps "b".
    let mut edited = schedule
        .items()
        .find(|i| i.id == "a")
        .cloned()
        .unwrap();
    edited.period_index = Some(3);
    place_item(&mut schedule, edited).unwrap();

    assert_eq!(schedule.period(0).unwrap().days[0].items.len(), 1);
    assert_eq!(schedule.period(3).unwrap().item_count(), 1);

    // Edit "b" too: period 0 loses its only day.
    let mut edited = schedule
        .items()
        .find(|i| i.id == "b")
        .cloned()
        .unwrap();
    edited.scheduled_relative_to_period_days = 3;
    edited.period_index = Some(1);
    place_item(&mut schedule, edited).unwrap();
    assert!(schedule.period(0).unwrap().days.is_empty());
}

#[test]
fn test_assign_without_resolution_is_unscheduled() {
    let mut schedule = build_schedule(&program(2, 7), &cycle(0, 0));
    // never resolved: no cached instant
    let item = ScheduleItem::relative_to_period("raw", 0, 0, "09:00");
    assert_eq!(
        assign_to_period(&mut schedule, item, true),
        ItemLocation::Unscheduled
    );
}

#[test]
fn test_every_day_key_is_unique_and_non_empty() {
    let mut schedule = build_schedule(&program(3, 7), &cycle(3, 3));
    let items = (0..40)
        .map(|i| ScheduleItem::relative_to_period(format!("i{i}"), i % 3, i % 7, "10:00"))
        .collect();
    add_items_to_schedule(&mut schedule, items).unwrap();

    for period in &schedule.periods {
        let mut keys: Vec<_> = period.days.iter().map(|d| d.key.clone()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), period.days.len());
        assert!(period.days.iter().all(|d| !d.items.is_empty()));
    }
}

proptest! {
    #[test]
    fn prop_period_count(count in 0u32..60, length in 1u32..30, pre in 0u32..30, post in 0u32..30) {
        let schedule = build_schedule(&program(count, length), &cycle(pre, post));
        prop_assert_eq!(schedule.periods.len(), count as usize + 2);
    }

    #[test]
    fn prop_periods_are_contiguous(count in 0u32..60, length in 1u32..30, post in 0u32..30) {
        let schedule = build_schedule(&program(count, length), &cycle(7, post));
        for pair in schedule.periods.windows(2) {
            prop_assert_eq!(pair[1].start.date(), pair[0].end.date() + Duration::days(1));
            prop_assert_eq!(pair[1].start, pair[0].end + Duration::seconds(1));
        }
    }

    #[test]
    fn prop_no_duplicate_placement(
        moves in proptest::collection::vec((0usize..5, -1i32..6, -2i32..9, proptest::bool::ANY), 1..60)
    ) {
        let mut schedule = build_schedule(&program(5, 7), &cycle(7, 5));
        let mut seen = std::collections::HashSet::new();

        for (id, period, days, unschedule) in moves {
            let id = format!("item-{id}");
            let mut item = ScheduleItem::relative_to_period(id.clone(), period, days, "12:00");
            if unschedule {
                item.scheduled_relative_to = None;
            }
            place_item(&mut schedule, item).unwrap();
            seen.insert(id);

            for id in &seen {
                prop_assert_eq!(occurrences(&schedule, id), 1);
            }
            for period in &schedule.periods {
                prop_assert!(period.days.iter().all(|d| !d.items.is_empty()));
            }
        }
    }
}
