//! Schedule, period and day types.
//!
//! Period and day boundaries are viewer-local wall-clock values
//! (`NaiveDateTime`). Item instants are absolute (`DateTime<Utc>`) and are
//! converted through the schedule's viewer offset when compared against
//! the calendar.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::item::ScheduleItem;

/// Format used for [`Day::key`].
pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Midnight at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last second of `date`.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    // 23:59:59 is always a valid time of day
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

/// One calendar day inside a period, holding at least one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    /// Calendar date string, unique within its period.
    pub key: String,
    /// Start of the day.
    pub date: NaiveDateTime,
    pub items: Vec<ScheduleItem>,
}

/// A slice of the cycle: pre-season, a regular period, or post-season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub name: String,
    pub info: Option<String>,
    /// -1 pre-season, `0..N` regular, `N` post-season.
    pub index: i32,
    /// Start of the first day.
    pub start: NaiveDateTime,
    /// End of the last day (inclusive).
    pub end: NaiveDateTime,
    #[serde(default)]
    pub days: Vec<Day>,
}

impl Period {
    pub fn is_pre_season(&self) -> bool {
        self.index < 0
    }

    /// Placement test: true when `local` falls between `start - 1 day` and
    /// `end + 1 day`, compared at day granularity with exclusive bounds.
    ///
    /// Net effect is an inclusive match on the calendar dates of `start`
    /// and `end`.
    ///
    /// A bound that would fall outside the calendar range is treated as open.
    pub fn contains_padded(&self, local: NaiveDateTime) -> bool {
        let day = local.date();
        let after_lower = self.start.date().pred_opt().map_or(true, |lower| lower < day);
        let before_upper = self.end.date().succ_opt().map_or(true, |upper| day < upper);
        after_lower && before_upper
    }

    /// Day-index test: strict `start < local < end`, no padding.
    pub fn contains_strict(&self, local: NaiveDateTime) -> bool {
        self.start < local && local < self.end
    }

    /// Whole days elapsed between the period start and `local`.
    pub fn day_index_of(&self, local: NaiveDateTime) -> i64 {
        (local - self.start).num_days()
    }

    pub fn day(&self, key: &str) -> Option<&Day> {
        self.days.iter().find(|d| d.key == key)
    }

    /// Number of items across all days.
    pub fn item_count(&self) -> usize {
        self.days.iter().map(|d| d.items.len()).sum()
    }
}

/// Where an item currently sits in a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemLocation {
    Unscheduled,
    Day { period_index: i32, day_key: String },
}

/// The calendar view of one program cycle.
///
/// Rebuilt from scratch for every program/cycle view; only item placement
/// mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub periods: Vec<Period>,
    #[serde(default)]
    pub unscheduled_items: Vec<ScheduleItem>,
    /// Viewer's offset from UTC in seconds.
    #[serde(default)]
    pub viewer_offset_seconds: i32,
}

impl Schedule {
    /// Use `offset` as the viewer's local time zone.
    pub fn with_viewer_offset(mut self, offset: FixedOffset) -> Self {
        self.viewer_offset_seconds = offset.local_minus_utc();
        self
    }

    pub fn viewer_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.viewer_offset_seconds).unwrap_or_else(|| Utc.fix())
    }

    /// Absolute instant to viewer-local wall clock.
    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.viewer_offset()).naive_local()
    }

    /// Viewer-local wall clock to absolute instant. `None` when the shift
    /// leaves the representable range.
    pub fn from_local(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        local
            .checked_sub_signed(Duration::seconds(i64::from(self.viewer_offset_seconds)))
            .map(|utc| utc.and_utc())
    }

    pub fn period(&self, index: i32) -> Option<&Period> {
        self.periods.iter().find(|p| p.index == index)
    }

    /// Regular periods only, in order.
    pub fn regular_periods(&self) -> impl Iterator<Item = &Period> {
        let post_season = self.periods.last().map(|p| p.index);
        self.periods
            .iter()
            .filter(move |p| p.index >= 0 && Some(p.index) != post_season)
    }

    /// Every placed or unscheduled item.
    pub fn items(&self) -> impl Iterator<Item = &ScheduleItem> {
        self.periods
            .iter()
            .flat_map(|p| p.days.iter())
            .flat_map(|d| d.items.iter())
            .chain(self.unscheduled_items.iter())
    }

    /// Find where the item with `id` sits, if anywhere.
    pub fn locate(&self, id: &str) -> Option<ItemLocation> {
        for period in &self.periods {
            for day in &period.days {
                if day.items.iter().any(|i| i.id == id) {
                    return Some(ItemLocation::Day {
                        period_index: period.index,
                        day_key: day.key.clone(),
                    });
                }
            }
        }
        if self.unscheduled_items.iter().any(|i| i.id == id) {
            return Some(ItemLocation::Unscheduled);
        }
        None
    }
}
