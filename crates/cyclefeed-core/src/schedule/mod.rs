//! Cycle schedules and item placement.
//!
//! This module provides:
//! - Period calendar derivation from a program and cycle
//! - Effective-instant resolution for period/timezone/global items
//! - Placement of items into period/day buckets

mod assign;
mod builder;
mod model;
mod resolver;

pub use assign::{add_items_to_schedule, assign_to_period, place_item, remove_from_schedule};
pub use builder::build_schedule;
pub use model::{end_of_day, start_of_day, Day, ItemLocation, Period, Schedule, DAY_KEY_FORMAT};
pub use resolver::{parse_date, parse_time, resolve_effective_instant};
