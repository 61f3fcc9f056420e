//! Placement of items into period/day buckets.

use tracing::debug;

use super::model::{start_of_day, Day, ItemLocation, Schedule, DAY_KEY_FORMAT};
use super::resolver::resolve_effective_instant;
use crate::error::ScheduleError;
use crate::item::ScheduleItem;

/// Place `item` into the day bucket matching its effective instant, or into
/// `unscheduled_items` when it has none or falls outside every period.
///
/// Unless `is_new`, any previous placement of the same id is removed first
/// (days left empty are pruned). The item's cached instant is used as is;
/// call [`resolve_effective_instant`] beforehand after editing it.
pub fn assign_to_period(schedule: &mut Schedule, item: ScheduleItem, is_new: bool) -> ItemLocation {
    if !is_new {
        remove_from_schedule(schedule, &item.id);
    }

    let instant = match (item.scheduled_relative_to, item.effective_instant()) {
        (Some(_), Some(instant)) => instant,
        _ => {
            debug!(item = %item.id, "no effective instant, leaving unscheduled");
            schedule.unscheduled_items.push(item);
            return ItemLocation::Unscheduled;
        }
    };

    let local = schedule.to_local(instant);
    let Some(period) = schedule.periods.iter_mut().find(|p| p.contains_padded(local)) else {
        debug!(item = %item.id, %local, "instant outside every period, leaving unscheduled");
        schedule.unscheduled_items.push(item);
        return ItemLocation::Unscheduled;
    };

    let key = local.date().format(DAY_KEY_FORMAT).to_string();
    debug!(item = %item.id, period = period.index, day = %key, "placing item");
    match period.days.iter_mut().find(|d| d.key == key) {
        Some(day) => day.items.push(item),
        None => period.days.push(Day {
            key: key.clone(),
            date: start_of_day(local.date()),
            items: vec![item],
        }),
    }

    ItemLocation::Day {
        period_index: period.index,
        day_key: key,
    }
}

/// Remove every occurrence of the item with `id`, pruning days that end up
/// empty. Returns the removed item, if any.
pub fn remove_from_schedule(schedule: &mut Schedule, id: &str) -> Option<ScheduleItem> {
    let mut removed = None;

    for period in &mut schedule.periods {
        for day in &mut period.days {
            if let Some(pos) = day.items.iter().position(|i| i.id == id) {
                removed = Some(day.items.remove(pos));
                day.items.retain(|i| i.id != id);
            }
        }
        period.days.retain(|d| !d.items.is_empty());
    }

    if let Some(pos) = schedule.unscheduled_items.iter().position(|i| i.id == id) {
        let item = schedule.unscheduled_items.remove(pos);
        schedule.unscheduled_items.retain(|i| i.id != id);
        removed.get_or_insert(item);
    }

    removed
}

/// Resolve and then (re)place a single edited item.
///
/// # Errors
///
/// Propagates resolver errors; the schedule is not touched in that case.
pub fn place_item(
    schedule: &mut Schedule,
    mut item: ScheduleItem,
) -> Result<ItemLocation, ScheduleError> {
    resolve_effective_instant(schedule, &mut item)?;
    Ok(assign_to_period(schedule, item, false))
}

/// Bulk initial load: resolve every item, then place them all in order.
///
/// # Errors
///
/// The first resolver error aborts the whole load before anything is
/// placed.
pub fn add_items_to_schedule(
    schedule: &mut Schedule,
    items: Vec<ScheduleItem>,
) -> Result<(), ScheduleError> {
    let mut resolved = Vec::with_capacity(items.len());
    for mut item in items {
        resolve_effective_instant(schedule, &mut item)?;
        resolved.push(item);
    }
    for item in resolved {
        assign_to_period(schedule, item, true);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ScheduleMode;
    use crate::program::{Cycle, Program};
    use crate::schedule::build_schedule;
    use chrono::{FixedOffset, NaiveDate};

    fn schedule() -> Schedule {
        let program = Program {
            id: "prog".to_string(),
            period_count: 5,
            period_length: 7,
            period_name: "Period".to_string(),
        };
        let cycle = Cycle {
            id: "cycle".to_string(),
            period_one_start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            schedule_on_sale_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            schedule_on_sale_end: None,
            schedule_on_sale_pre_sale_days: 7,
            schedule_on_sale_post_sale_days: 0,
            post_season_days: 5,
            meal_period_early_access_days: 0,
            period_info: vec![],
        };
        build_schedule(&program, &cycle)
    }

    fn occurrences(schedule: &Schedule, id: &str) -> usize {
        schedule.items().filter(|i| i.id == id).count()
    }

    #[test]
    fn places_into_matching_day() {
        let mut s = schedule();
        let location =
            place_item(&mut s, ScheduleItem::relative_to_period("a", 0, 2, "14:00")).unwrap();
        assert_eq!(
            location,
            ItemLocation::Day {
                period_index: 0,
                day_key: "2020-01-03".to_string(),
            }
        );
        let day = s.period(0).unwrap().day("2020-01-03").unwrap();
        assert_eq!(day.date.to_string(), "2020-01-03 00:00:00");
        assert_eq!(day.items.len(), 1);
    }

    #[test]
    fn reassigning_is_idempotent() {
        let mut s = schedule();
        let item = ScheduleItem::relative_to_period("a", 0, 2, "14:00");
        place_item(&mut s, item.clone()).unwrap();
        place_item(&mut s, item).unwrap();
        assert_eq!(occurrences(&s, "a"), 1);
    }

    #[test]
    fn moving_prunes_the_empty_day() {
        let mut s = schedule();
        let mut item = ScheduleItem::relative_to_period("a", 0, 2, "14:00");
        place_item(&mut s, item.clone()).unwrap();

        item.period_index = Some(1);
        place_item(&mut s, item).unwrap();

        assert!(s.period(0).unwrap().days.is_empty());
        assert_eq!(s.period(1).unwrap().item_count(), 1);
        assert_eq!(occurrences(&s, "a"), 1);
    }

    #[test]
    fn clearing_mode_moves_to_unscheduled() {
        let mut s = schedule();
        let mut item = ScheduleItem::relative_to_period("a", 0, 2, "14:00");
        place_item(&mut s, item.clone()).unwrap();

        item.scheduled_relative_to = None;
        assert_eq!(place_item(&mut s, item.clone()).unwrap(), ItemLocation::Unscheduled);
        assert_eq!(s.unscheduled_items.len(), 1);
        assert_eq!(occurrences(&s, "a"), 1);

        // and back again
        item.scheduled_relative_to = Some(ScheduleMode::Period);
        place_item(&mut s, item).unwrap();
        assert!(s.unscheduled_items.is_empty());
        assert_eq!(occurrences(&s, "a"), 1);
    }

    #[test]
    fn outside_every_period_is_unscheduled() {
        let mut s = schedule();
        let item = ScheduleItem::at("far", ScheduleMode::Global, "2021-06-01", "09:00");
        assert_eq!(place_item(&mut s, item).unwrap(), ItemLocation::Unscheduled);
    }

    #[test]
    fn boundary_day_lands_in_its_own_period() {
        let mut s = schedule();
        let item = ScheduleItem::at("edge", ScheduleMode::Timezone, "2020-01-08", "00:00");
        assert_eq!(
            place_item(&mut s, item).unwrap(),
            ItemLocation::Day {
                period_index: 1,
                day_key: "2020-01-08".to_string(),
            }
        );
    }

    #[test]
    fn global_item_uses_viewer_local_day() {
        let mut s = schedule().with_viewer_offset(FixedOffset::west_opt(5 * 3600).unwrap());
        // 02:00 UTC on the 8th is 21:00 on the 7th for this viewer
        let item = ScheduleItem::at("g", ScheduleMode::Global, "2020-01-08", "02:00");
        assert_eq!(
            place_item(&mut s, item).unwrap(),
            ItemLocation::Day {
                period_index: 0,
                day_key: "2020-01-07".to_string(),
            }
        );
    }

    #[test]
    fn same_day_items_keep_insertion_order() {
        let mut s = schedule();
        add_items_to_schedule(
            &mut s,
            vec![
                ScheduleItem::relative_to_period("late", 0, 0, "18:00"),
                ScheduleItem::relative_to_period("early", 0, 0, "06:00"),
            ],
        )
        .unwrap();
        let ids: Vec<_> = s.period(0).unwrap().days[0]
            .items
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(ids, ["late", "early"]);
    }

    #[test]
    fn bulk_load_aborts_without_partial_placement() {
        let mut s = schedule();
        let result = add_items_to_schedule(
            &mut s,
            vec![
                ScheduleItem::relative_to_period("ok", 0, 0, "18:00"),
                ScheduleItem::relative_to_period("bad", 20, 0, "06:00"),
            ],
        );
        assert!(matches!(result, Err(ScheduleError::PeriodNotFound { .. })));
        assert_eq!(s.items().count(), 0);
    }

    #[test]
    fn remove_returns_item() {
        let mut s = schedule();
        place_item(&mut s, ScheduleItem::relative_to_period("a", 0, 2, "14:00")).unwrap();
        let removed = remove_from_schedule(&mut s, "a").unwrap();
        assert_eq!(removed.id, "a");
        assert_eq!(s.locate("a"), None);
        assert!(remove_from_schedule(&mut s, "a").is_none());
    }
}
