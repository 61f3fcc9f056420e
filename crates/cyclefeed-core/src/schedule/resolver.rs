//! Effective-instant resolution for the three addressing modes.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::debug;

use super::model::{Schedule, DAY_KEY_FORMAT};
use crate::error::ScheduleError;
use crate::item::{ScheduleItem, ScheduleMode};

/// Compute the absolute instant `item` is scheduled at, store it on the
/// item and return it.
///
/// Unscheduled items (no mode) resolve to `None`. On error the cached
/// instant is left untouched.
///
/// # Errors
///
/// [`ScheduleError::InvalidScheduleFields`] when a field the mode needs is
/// missing or does not parse strictly, [`ScheduleError::PeriodNotFound`]
/// when a period-relative item points at a period the schedule lacks.
pub fn resolve_effective_instant(
    schedule: &Schedule,
    item: &mut ScheduleItem,
) -> Result<Option<DateTime<Utc>>, ScheduleError> {
    let instant = match item.scheduled_relative_to {
        None => None,
        Some(ScheduleMode::Global) => {
            let (date, time) = date_and_time(item)?;
            Some(NaiveDateTime::new(date, time).and_utc())
        }
        Some(ScheduleMode::Timezone) => {
            let (date, time) = date_and_time(item)?;
            let local = NaiveDateTime::new(date, time);
            Some(
                schedule
                    .from_local(local)
                    .ok_or_else(|| invalid(item, &format!("{local} is out of range")))?,
            )
        }
        Some(ScheduleMode::Period) => Some(resolve_period_relative(schedule, item)?),
    };

    debug!(item = %item.id, mode = ?item.scheduled_relative_to, ?instant, "resolved effective instant");
    item.set_effective_instant(instant);
    Ok(instant)
}

fn resolve_period_relative(
    schedule: &Schedule,
    item: &ScheduleItem,
) -> Result<DateTime<Utc>, ScheduleError> {
    let time = required_time(item)?;
    let period_index = item
        .period_index
        .ok_or_else(|| invalid(item, "period mode requires a period index"))?;
    let period = schedule
        .period(period_index)
        .ok_or_else(|| ScheduleError::PeriodNotFound {
            item_id: item.id.clone(),
            period_index,
        })?;

    // The calendar date comes from period arithmetic; only the clock
    // components come from the stored time.
    let days = item.scheduled_relative_to_period_days;
    let day = period
        .start
        .checked_add_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| invalid(item, &format!("period day offset {days} is out of range")))?;
    let local = day.date().and_time(time);
    schedule
        .from_local(local)
        .ok_or_else(|| invalid(item, &format!("{local} is out of range")))
}

fn date_and_time(item: &ScheduleItem) -> Result<(NaiveDate, NaiveTime), ScheduleError> {
    let raw = item
        .schedule_date
        .as_deref()
        .ok_or_else(|| invalid(item, "schedule date is required"))?;
    let date = parse_date(raw).ok_or_else(|| invalid(item, &format!("malformed date {raw:?}")))?;
    Ok((date, required_time(item)?))
}

fn required_time(item: &ScheduleItem) -> Result<NaiveTime, ScheduleError> {
    let raw = item
        .schedule_time
        .as_deref()
        .ok_or_else(|| invalid(item, "schedule time is required"))?;
    parse_time(raw).ok_or_else(|| invalid(item, &format!("malformed time {raw:?}")))
}

/// Strict `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, DAY_KEY_FORMAT).ok()
}

/// Strict `HH:MM` or `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    match raw.len() {
        5 => NaiveTime::parse_from_str(raw, "%H:%M").ok(),
        8 => NaiveTime::parse_from_str(raw, "%H:%M:%S").ok(),
        _ => None,
    }
}

fn invalid(item: &ScheduleItem, reason: &str) -> ScheduleError {
    ScheduleError::InvalidScheduleFields {
        item_id: item.id.clone(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{Cycle, Program};
    use crate::schedule::build_schedule;
    use chrono::FixedOffset;

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

    #[test]
    fn unscheduled_resolves_to_none() {
        let mut item = ScheduleItem::new("a");
        assert_eq!(resolve_effective_instant(&schedule(), &mut item), Ok(None));
        assert!(item.effective_instant().is_none());
    }

    #[test]
    fn period_mode_uses_period_start_plus_days() {
        let mut item = ScheduleItem::relative_to_period("a", 0, 2, "14:00:00");
        let instant = resolve_effective_instant(&schedule(), &mut item).unwrap();
        assert_eq!(instant.unwrap().to_rfc3339(), "2020-01-03T14:00:00+00:00");
        assert_eq!(item.effective_instant(), instant);
    }

    #[test]
    fn period_mode_ignores_stored_date() {
        let mut item = ScheduleItem::relative_to_period("a", 1, -1, "08:30");
        item.schedule_date = Some("1999-05-05".to_string());
        let instant = resolve_effective_instant(&schedule(), &mut item).unwrap();
        assert_eq!(instant.unwrap().to_rfc3339(), "2020-01-07T08:30:00+00:00");
    }

    #[test]
    fn period_mode_unknown_period() {
        let mut item = ScheduleItem::relative_to_period("a", 20, 0, "10:00");
        assert_eq!(
            resolve_effective_instant(&schedule(), &mut item),
            Err(ScheduleError::PeriodNotFound {
                item_id: "a".to_string(),
                period_index: 20,
            })
        );
    }

    #[test]
    fn period_mode_day_offset_out_of_range() {
        for days in [i32::MAX, i32::MIN] {
            let mut item = ScheduleItem::relative_to_period("huge", 0, days, "10:00");
            assert!(matches!(
                resolve_effective_instant(&schedule(), &mut item),
                Err(ScheduleError::InvalidScheduleFields { ref item_id, .. }) if item_id == "huge"
            ));
            assert!(item.effective_instant().is_none());
        }
    }

    #[test]
    fn period_mode_requires_time() {
        let mut item = ScheduleItem::relative_to_period("a", 0, 0, "10:00");
        item.schedule_time = None;
        assert!(matches!(
            resolve_effective_instant(&schedule(), &mut item),
            Err(ScheduleError::InvalidScheduleFields { .. })
        ));
    }

    #[test]
    fn global_mode_is_utc_regardless_of_viewer() {
        let s = schedule().with_viewer_offset(FixedOffset::east_opt(9 * 3600).unwrap());
        let mut item = ScheduleItem::at("a", ScheduleMode::Global, "2020-01-02", "10:00");
        let instant = resolve_effective_instant(&s, &mut item).unwrap().unwrap();
        assert_eq!(instant.to_rfc3339(), "2020-01-02T10:00:00+00:00");
    }

    #[test]
    fn timezone_mode_is_viewer_wall_clock() {
        let s = schedule().with_viewer_offset(FixedOffset::east_opt(9 * 3600).unwrap());
        let mut item = ScheduleItem::at("a", ScheduleMode::Timezone, "2020-01-02", "10:00");
        let instant = resolve_effective_instant(&s, &mut item).unwrap().unwrap();
        assert_eq!(instant.to_rfc3339(), "2020-01-02T01:00:00+00:00");
        assert_eq!(s.to_local(instant).to_string(), "2020-01-02 10:00:00");
    }

    #[test]
    fn malformed_fields_are_rejected() {
        for (date, time) in [
            (Some("2020-13-01"), Some("10:00")),
            (Some("2020-1-1"), Some("10:00")),
            (Some("2020-01-01"), Some("25:00")),
            (Some("2020-01-01"), Some("10")),
            (None, Some("10:00")),
            (Some("2020-01-01"), None),
        ] {
            let mut item = ScheduleItem::new("bad");
            item.scheduled_relative_to = Some(ScheduleMode::Global);
            item.schedule_date = date.map(str::to_string);
            item.schedule_time = time.map(str::to_string);
            assert!(
                matches!(
                    resolve_effective_instant(&schedule(), &mut item),
                    Err(ScheduleError::InvalidScheduleFields { .. })
                ),
                "expected rejection for {date:?} {time:?}"
            );
        }
    }
}
