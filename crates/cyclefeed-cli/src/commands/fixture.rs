//! Program fixture files.
//!
//! A fixture bundles everything the commands need to rebuild a cycle view:
//!
//! ```text
//! {
//!   "program":   { "id": "...", "period_count": 5, "period_length": 7 },
//!   "cycle":     { "id": "...", "period_one_start_date": "2020-01-01", ... },
//!   "meal_plan": { "id": "..." },
//!   "items":     [ { "id": "...", "scheduled_relative_to": "period", ... } ]
//! }
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use cyclefeed_core::{Cycle, MealPlan, Program, ScheduleItem};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub program: Program,
    pub cycle: Cycle,
    #[serde(default)]
    pub meal_plan: Option<MealPlan>,
    #[serde(default)]
    pub items: Vec<ScheduleItem>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read fixture {}: {e}", path.display()))?;
        let fixture = serde_json::from_str(&content)
            .map_err(|e| format!("invalid fixture {}: {e}", path.display()))?;
        Ok(fixture)
    }
}

/// Parse an `--at` argument.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
}
