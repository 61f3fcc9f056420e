//! Viewer feed over a program cycle.
//!
//! This module provides:
//! - The paged item source contract and an in-memory implementation
//! - Persisted dismissals behind a key-value store contract
//! - The feed engine: pagination, dedup, gap filling, meal-plan card,
//!   historical preview mode

mod dismissed;
mod engine;
mod source;

pub use dismissed::{DismissedCache, KeyValueStore, MemoryKeyValueStore, DISMISSED_KEY};
pub use engine::{FeedEngine, FeedEntry, MealPlanCard, PeriodDayIndex};
pub use source::{FeedFilters, ItemPage, PagedItemSource, VecItemSource};
