//! Program and cycle configuration.
//!
//! A [`Program`] describes the shape of every run (how many periods, how
//! long each one is). A [`Cycle`] is one concrete run of that program with
//! its own dates and per-period label overrides.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Index reserved for the pre-season pseudo period.
pub const PRE_SEASON_INDEX: i32 = -1;

/// Shape of a subscription program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    /// Number of regular periods per cycle.
    pub period_count: u32,
    /// Length of each regular period in days (at least 1).
    pub period_length: u32,
    /// Label template for regular periods, e.g. "Week" renders "Week 3".
    #[serde(default = "default_period_name")]
    pub period_name: String,
}

impl Program {
    /// Index of the post-season pseudo period.
    pub fn post_season_index(&self) -> i32 {
        self.period_count as i32
    }
}

fn default_period_name() -> String {
    "Period".to_string()
}

/// Label override for a single period of a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodInfo {
    /// -1 for pre-season, `0..period_count` for regular periods,
    /// `period_count` for post-season.
    pub index: i32,
    pub name: Option<String>,
    pub info: Option<String>,
}

/// One run of a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: String,
    pub period_one_start_date: NaiveDate,
    pub schedule_on_sale_start: NaiveDate,
    #[serde(default)]
    pub schedule_on_sale_end: Option<NaiveDate>,
    #[serde(default)]
    pub schedule_on_sale_pre_sale_days: u32,
    #[serde(default)]
    pub schedule_on_sale_post_sale_days: u32,
    #[serde(default)]
    pub post_season_days: u32,
    #[serde(default)]
    pub meal_period_early_access_days: u32,
    #[serde(default)]
    pub period_info: Vec<PeriodInfo>,
}

impl Cycle {
    /// Override entry for the given period index, if any.
    pub fn period_info(&self, index: i32) -> Option<&PeriodInfo> {
        self.period_info.iter().find(|info| info.index == index)
    }
}

/// Reference to the meal plan currently shown to the viewer.
///
/// Only identity and label matter to the feed; the plan body lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}
