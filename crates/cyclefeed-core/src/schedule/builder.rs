//! Derive the period calendar of a cycle.

use chrono::{Days, NaiveDate};

use super::model::{end_of_day, start_of_day, Period, Schedule};
use crate::program::{Cycle, Program, PRE_SEASON_INDEX};

/// Build the schedule of `cycle`: pre-season, `program.period_count`
/// regular periods, then post-season.
///
/// Pure and deterministic. Period label overrides from
/// `cycle.period_info` replace only `name` and `info`.
pub fn build_schedule(program: &Program, cycle: &Cycle) -> Schedule {
    let mut periods = Vec::with_capacity(program.period_count as usize + 2);
    let period_one = cycle.period_one_start_date;

    let pre_start = sub_days(
        cycle.schedule_on_sale_start,
        cycle.schedule_on_sale_pre_sale_days,
    );
    let pre_end = sub_days(period_one, 1);
    periods.push(labelled(
        cycle,
        PRE_SEASON_INDEX,
        "Pre Season".to_string(),
        pre_start,
        pre_end,
    ));

    let length = program.period_length.max(1);
    let mut last_end = pre_end;
    for i in 0..program.period_count {
        let offset = i * length;
        let start = add_days(period_one, offset);
        let end = add_days(period_one, offset + length - 1);
        periods.push(labelled(
            cycle,
            i as i32,
            format!("{} {}", program.period_name, i + 1),
            start,
            end,
        ));
        last_end = end;
    }

    let post_start = add_days(last_end, 1);
    let post_end = add_days(post_start, cycle.post_season_days);
    periods.push(labelled(
        cycle,
        program.post_season_index(),
        "Post Season".to_string(),
        post_start,
        post_end,
    ));

    Schedule {
        periods,
        unscheduled_items: Vec::new(),
        viewer_offset_seconds: 0,
    }
}

fn labelled(cycle: &Cycle, index: i32, default_name: String, start: NaiveDate, end: NaiveDate) -> Period {
    let (name, info) = match cycle.period_info(index) {
        Some(over) => (
            over.name.clone().unwrap_or(default_name),
            over.info.clone(),
        ),
        None => (default_name, None),
    };
    Period {
        name,
        info,
        index,
        start: start_of_day(start),
        end: end_of_day(end),
        days: Vec::new(),
    }
}

fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MAX)
}

fn sub_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}
