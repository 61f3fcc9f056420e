//! # cyclefeed Core Library
//!
//! Calendar and feed logic for subscription programs that run in repeating
//! cycles. A cycle is split into a pre-season, a fixed number of equal
//! periods and a post-season; content items are attached to moments of the
//! cycle and shown to the viewer as a period/day calendar and as a
//! paginated feed.
//!
//! ## Architecture
//!
//! - **Schedule**: period calendar derivation, effective-instant resolution
//!   for the three addressing modes, and placement into period/day buckets
//! - **Feed**: paginated, dismissal-aware feed with gap filling, a synthetic
//!   meal-plan card and a historical preview mode
//! - **Storage**: TOML configuration and SQLite-backed collaborators
//!
//! ## Key Components
//!
//! - [`build_schedule`]: Program + cycle to [`Schedule`]
//! - [`resolve_effective_instant`]: Item addressing to an absolute instant
//! - [`assign_to_period`]: Item placement
//! - [`FeedEngine`]: The viewer feed
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod error;
pub mod feed;
pub mod item;
pub mod program;
pub mod schedule;
pub mod storage;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, OptionError, Result, ScheduleError, StoreError};
pub use feed::{
    FeedEngine, FeedEntry, FeedFilters, ItemPage, KeyValueStore, MealPlanCard,
    MemoryKeyValueStore, PagedItemSource, PeriodDayIndex, VecItemSource,
};
pub use item::{validate_deselection, ItemOption, ScheduleItem, ScheduleMode};
pub use program::{Cycle, MealPlan, PeriodInfo, Program};
pub use schedule::{
    add_items_to_schedule, assign_to_period, build_schedule, place_item, remove_from_schedule,
    resolve_effective_instant, Day, ItemLocation, Period, Schedule,
};
pub use storage::{Config, Database, SqliteItemSource};
