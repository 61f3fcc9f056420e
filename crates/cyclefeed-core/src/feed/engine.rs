//! Feed engine.
//!
//! Builds the viewer's feed one page at a time from a [`PagedItemSource`],
//! dropping dismissed and already-shown items and topping the page back up
//! so the caller gets a short page only when the source runs dry.
//!
//! ## Usage
//!
//! ```ignore
//! let mut feed = FeedEngine::new(program, cycle, meal_plan, source, store);
//! feed.reset().await?;
//! let page = feed.fetch(10).await?;
//! feed.dismiss(&page[0].id).await?;
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::dismissed::{DismissedCache, KeyValueStore};
use super::source::{FeedFilters, PagedItemSource};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::item::ScheduleItem;
use crate::program::{Cycle, MealPlan, Program};
use crate::schedule::{build_schedule, resolve_effective_instant, Schedule};

/// Synthetic entry pointing the viewer at the current meal plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanCard {
    pub meal_plan: MealPlan,
    pub period_index: i32,
    pub day_index: i64,
    pub next_period_index: i32,
    /// Whether the next period's meal plan is already open to the viewer.
    pub next_period_accessible: bool,
}

/// One row of the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEntry {
    Scheduled(ScheduleItem),
    MealPlan(MealPlanCard),
}

impl FeedEntry {
    /// Stable identifier of the entry within a feed.
    pub fn id(&self) -> String {
        match self {
            FeedEntry::Scheduled(item) => item.id.clone(),
            FeedEntry::MealPlan(card) => format!("meal-plan:{}", card.meal_plan.id),
        }
    }

    pub fn as_item(&self) -> Option<&ScheduleItem> {
        match self {
            FeedEntry::Scheduled(item) => Some(item),
            FeedEntry::MealPlan(_) => None,
        }
    }
}

/// Position of an instant within the regular periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDayIndex {
    pub period_index: i32,
    pub day_index: i64,
}

impl PeriodDayIndex {
    /// Before the first regular period.
    pub const NONE: Self = Self {
        period_index: -1,
        day_index: -1,
    };
}

/// Paginated, dismissal-aware feed over one program cycle.
pub struct FeedEngine {
    program: Program,
    cycle: Cycle,
    meal_plan: Option<MealPlan>,
    schedule: Schedule,
    source: Box<dyn PagedItemSource>,
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    dismissed: DismissedCache,
    entries: Vec<FeedEntry>,
    current_feed_item: Option<String>,
    max_period_offset: Option<i32>,
    search: Option<String>,
    /// Bumped on every reset; tags log lines of the fetches that follow.
    generation: u64,
}

impl FeedEngine {
    /// Create an engine for `cycle`. Call [`reset`](Self::reset) before the
    /// first fetch.
    pub fn new(
        program: Program,
        cycle: Cycle,
        meal_plan: Option<MealPlan>,
        source: Box<dyn PagedItemSource>,
        store: Box<dyn KeyValueStore>,
    ) -> Self {
        let schedule = build_schedule(&program, &cycle);
        Self {
            program,
            cycle,
            meal_plan,
            schedule,
            source,
            store,
            clock: Box::new(SystemClock),
            dismissed: DismissedCache::default(),
            entries: Vec::new(),
            current_feed_item: None,
            max_period_offset: None,
            search: None,
            generation: 0,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_viewer_offset(mut self, offset: chrono::FixedOffset) -> Self {
        self.schedule = self.schedule.with_viewer_offset(offset);
        self
    }

    pub fn with_dismissed_key(mut self, key: impl Into<String>) -> Self {
        self.dismissed = DismissedCache::new(key);
        self
    }

    /// Switch to another program/cycle: rebuilds the schedule, drops the
    /// current feed and rewinds the source.
    pub async fn initialize(
        &mut self,
        program: Program,
        cycle: Cycle,
        meal_plan: Option<MealPlan>,
    ) -> Result<()> {
        let offset = self.schedule.viewer_offset();
        self.schedule = build_schedule(&program, &cycle).with_viewer_offset(offset);
        self.program = program;
        self.cycle = cycle;
        self.meal_plan = meal_plan;
        self.entries.clear();
        self.current_feed_item = None;
        self.source.reset().await?;
        info!(program = %self.program.id, cycle = %self.cycle.id, "feed initialized");
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn cycle(&self) -> &Cycle {
        &self.cycle
    }

    /// Everything fetched so far, in feed order.
    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_live_feed(&self) -> bool {
        self.max_period_offset.is_none()
    }

    pub fn period_offset(&self) -> Option<i32> {
        self.max_period_offset
    }

    pub fn dismissed_ids(&self) -> &[String] {
        self.dismissed.ids()
    }

    pub fn current_feed_item(&self) -> Option<&FeedEntry> {
        let id = self.current_feed_item.as_deref()?;
        self.entries.iter().find(|e| e.id() == id)
    }

    fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id() == id)
    }

    fn filters(&self) -> FeedFilters {
        FeedFilters {
            max_period_index: self.max_period_offset,
            search: self.search.clone(),
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Mark the entry with `id` as the one being viewed. Returns false when
    /// no such entry is in the feed.
    pub fn set_current_feed_item(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.current_feed_item = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Restrict fetches to periods up to `max_period_index` (preview of a
    /// past feed). Applies from the next fetch; the meal-plan card is only
    /// dropped by the next reset.
    pub fn set_period_offset(&mut self, max_period_index: i32) {
        self.max_period_offset = Some(max_period_index);
    }

    /// Back to the live feed. Applies from the next fetch; the meal-plan
    /// card returns with the next reset.
    pub fn clear_period_offset(&mut self) {
        self.max_period_offset = None;
    }

    /// Free-text filter forwarded to the source from the next fetch on.
    /// Entries already in the feed stay until the next reset.
    pub fn set_search(&mut self, search: Option<String>) {
        self.search = search;
    }

    /// Drop the feed and start over from the first page.
    ///
    /// Re-reads the dismissal list on the next access and, in live mode,
    /// puts the meal-plan card at the top.
    pub async fn reset(&mut self) -> Result<()> {
        self.generation += 1;
        self.entries.clear();
        self.current_feed_item = None;
        self.dismissed.invalidate();
        self.source.reset().await?;

        if self.is_live_feed() {
            if let Some(card) = self.meal_plan_card() {
                self.entries.push(FeedEntry::MealPlan(card));
            }
        }
        info!(generation = self.generation, live = self.is_live_feed(), "feed reset");
        Ok(())
    }

    /// Fetch up to `count` new items and append them to the feed.
    ///
    /// Dismissed items and items already in the feed are dropped, and the
    /// shortfall is requested again until `count` items were kept or the
    /// source is exhausted. Never appends more than `count` items. Returns
    /// the appended items.
    ///
    /// # Errors
    ///
    /// A source failure or an item the date resolver rejects aborts the
    /// call; nothing from it is appended.
    pub async fn fetch(&mut self, count: usize) -> Result<Vec<ScheduleItem>> {
        self.dismissed.load(self.store.as_ref()).await?;
        let filters = self.filters();
        let mut appended: Vec<ScheduleItem> = Vec::new();

        while appended.len() < count {
            let requested = count - appended.len();
            let page = self.source.fetch_next(requested, &filters).await?;
            let received = page.items.len();
            let mut kept = 0;

            for mut item in page.items {
                // a source may hand back more than it was asked for
                if appended.len() == count {
                    break;
                }
                if item.effective_instant().is_none() {
                    resolve_effective_instant(&self.schedule, &mut item)?;
                }
                if self.dismissed.contains(&item.id)
                    || self.contains(&item.id)
                    || appended.iter().any(|a| a.id == item.id)
                {
                    continue;
                }
                kept += 1;
                appended.push(item);
            }

            debug!(
                generation = self.generation,
                requested,
                received,
                kept,
                has_more = page.has_more,
                "feed page"
            );

            if !page.has_more || received == 0 {
                break;
            }
        }

        self.entries
            .extend(appended.iter().cloned().map(FeedEntry::Scheduled));
        Ok(appended)
    }

    /// Permanently hide the item with `id`: persisted at once and removed
    /// from the feed. Returns false if it was already dismissed.
    pub async fn dismiss(&mut self, id: &str) -> Result<bool> {
        let newly = self.dismissed.dismiss(self.store.as_ref(), id).await?;
        self.entries.retain(|e| e.id() != id);
        if self.current_feed_item.as_deref() == Some(id) {
            self.current_feed_item = None;
        }
        info!(item = %id, newly, "feed item dismissed");
        Ok(newly)
    }

    /// Locate `timestamp` (default: now) within the regular periods.
    ///
    /// Past the last regular period this reports the final day of the
    /// cycle; before or between periods (bounds are strict) it reports
    /// [`PeriodDayIndex::NONE`].
    pub fn get_period_day_indexes(&self, timestamp: Option<DateTime<Utc>>) -> PeriodDayIndex {
        let local = self
            .schedule
            .to_local(timestamp.unwrap_or_else(|| self.clock.now()));

        if let Some(last) = self.schedule.regular_periods().last() {
            if local > last.end {
                return PeriodDayIndex {
                    period_index: self.program.period_count as i32,
                    day_index: i64::from(self.program.period_length) - 1,
                };
            }
        }

        self.schedule
            .regular_periods()
            .find(|p| p.contains_strict(local))
            .map(|p| PeriodDayIndex {
                period_index: p.index,
                day_index: p.day_index_of(local),
            })
            .unwrap_or(PeriodDayIndex::NONE)
    }

    /// The meal-plan card for right now, if the cycle has started and a
    /// meal plan is set.
    pub fn meal_plan_card(&self) -> Option<MealPlanCard> {
        let meal_plan = self.meal_plan.clone()?;
        let now = self.clock.now();
        let local_now = self.schedule.to_local(now);
        if local_now.date() < self.cycle.period_one_start_date {
            return None;
        }

        let position = self.get_period_day_indexes(Some(now));
        let next_period_index = position.period_index + 1;
        let early = Duration::days(i64::from(self.cycle.meal_period_early_access_days));
        let next_period_accessible = next_period_index < self.program.period_count as i32
            && self.schedule.period(next_period_index).is_some_and(|next| {
                next.start
                    .checked_sub_signed(early)
                    .map_or(true, |opens| local_now >= opens)
            });

        Some(MealPlanCard {
            meal_plan,
            period_index: position.period_index,
            day_index: position.day_index,
            next_period_index,
            next_period_accessible,
        })
    }
}
