//! Scheduled content items and their attached program options.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OptionError;

/// How an item's calendar moment is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    /// Offset in days from the start of a period, plus a time of day.
    Period,
    /// Date and time read as the viewer's local wall clock.
    Timezone,
    /// Date and time read as UTC; the same instant for every viewer.
    Global,
}

/// A program option attached to an item (size, variant, add-on, ...).
///
/// The schedule and feed engines carry these through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOption {
    pub id: String,
    pub option_type: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub selected: bool,
}

/// A content unit placed on the program calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: String,
    #[serde(default)]
    pub scheduled_relative_to: Option<ScheduleMode>,
    /// Day offset from the period start, only read in `period` mode.
    #[serde(default)]
    pub scheduled_relative_to_period_days: i32,
    /// Only read in `period` mode.
    #[serde(default)]
    pub period_index: Option<i32>,
    /// `YYYY-MM-DD`, read in `timezone` and `global` modes.
    #[serde(default)]
    pub schedule_date: Option<String>,
    /// `HH:MM[:SS]`, read in every scheduled mode.
    #[serde(default)]
    pub schedule_time: Option<String>,
    /// Cached result of the date resolver.
    #[serde(default, skip_deserializing)]
    effective_instant: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sticky_in_feed: bool,
    #[serde(default = "default_feed_format")]
    pub feed_format: String,
    #[serde(default)]
    pub options: Vec<ItemOption>,
}

fn default_feed_format() -> String {
    "default".to_string()
}

impl ScheduleItem {
    /// Create an unscheduled item with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scheduled_relative_to: None,
            scheduled_relative_to_period_days: 0,
            period_index: None,
            schedule_date: None,
            schedule_time: None,
            effective_instant: None,
            sticky_in_feed: false,
            feed_format: default_feed_format(),
            options: Vec::new(),
        }
    }

    /// Item addressed relative to the start of period `period_index`.
    pub fn relative_to_period(
        id: impl Into<String>,
        period_index: i32,
        days: i32,
        time: impl Into<String>,
    ) -> Self {
        Self {
            scheduled_relative_to: Some(ScheduleMode::Period),
            period_index: Some(period_index),
            scheduled_relative_to_period_days: days,
            schedule_time: Some(time.into()),
            ..Self::new(id)
        }
    }

    /// Item addressed by calendar date and time in the given mode.
    pub fn at(
        id: impl Into<String>,
        mode: ScheduleMode,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            scheduled_relative_to: Some(mode),
            schedule_date: Some(date.into()),
            schedule_time: Some(time.into()),
            ..Self::new(id)
        }
    }

    /// Last instant computed by the date resolver.
    pub fn effective_instant(&self) -> Option<DateTime<Utc>> {
        self.effective_instant
    }

    pub(crate) fn set_effective_instant(&mut self, instant: Option<DateTime<Utc>>) {
        self.effective_instant = instant;
    }

    /// Whether the item has an addressing mode and a resolved instant.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled_relative_to.is_some() && self.effective_instant.is_some()
    }

    /// Deselect an attached option, refusing to leave its type empty.
    pub fn deselect_option(&mut self, option_id: &str) -> Result<(), OptionError> {
        validate_deselection(&self.options, option_id)?;
        if let Some(option) = self.options.iter_mut().find(|o| o.id == option_id) {
            option.selected = false;
        }
        Ok(())
    }
}

/// Check that deselecting `option_id` keeps at least one selected option of
/// the same type among `options`.
///
/// Deselecting an option that is already unselected is always allowed.
pub fn validate_deselection(options: &[ItemOption], option_id: &str) -> Result<(), OptionError> {
    let target = options
        .iter()
        .find(|o| o.id == option_id)
        .ok_or_else(|| OptionError::NotFound(option_id.to_string()))?;

    if !target.selected {
        return Ok(());
    }

    let remaining = options
        .iter()
        .filter(|o| o.option_type == target.option_type && o.selected && o.id != target.id)
        .count();

    if remaining == 0 {
        return Err(OptionError::LastSelectedOfType {
            option_id: target.id.clone(),
            option_type: target.option_type.clone(),
        });
    }
    Ok(())
}
