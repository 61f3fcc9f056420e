//! Paged item source consumed by the feed engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::item::{ScheduleItem, ScheduleMode};

/// Filters forwarded with every page request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilters {
    /// Skip period-relative items beyond this period.
    pub max_period_index: Option<i32>,
    /// Case-insensitive free-text match.
    pub search: Option<String>,
}

impl FeedFilters {
    /// Whether `item` passes these filters.
    ///
    /// Items not addressed relative to a period are never cut by
    /// `max_period_index`. Search looks at the id, the feed format and
    /// option labels.
    pub fn matches(&self, item: &ScheduleItem) -> bool {
        if let Some(max) = self.max_period_index {
            if item.scheduled_relative_to == Some(ScheduleMode::Period)
                && item.period_index.is_some_and(|index| index > max)
            {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                item.id.to_lowercase().contains(&needle)
                    || item.feed_format.to_lowercase().contains(&needle)
                    || item.options.iter().any(|o| {
                        o.label
                            .as_deref()
                            .is_some_and(|l| l.to_lowercase().contains(&needle))
                    })
            }
        }
    }
}

/// One page returned by a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPage {
    pub items: Vec<ScheduleItem>,
    /// False once the source is exhausted.
    pub has_more: bool,
}

/// Cursor-based source of feed items, in feed order.
#[async_trait]
pub trait PagedItemSource: Send + Sync {
    /// Return up to `count` items after the cursor and advance it.
    async fn fetch_next(
        &mut self,
        count: usize,
        filters: &FeedFilters,
    ) -> Result<ItemPage, StoreError>;

    /// Rewind the cursor to the first item.
    async fn reset(&mut self) -> Result<(), StoreError>;
}

/// In-memory source over a fixed list.
#[derive(Debug, Clone, Default)]
pub struct VecItemSource {
    items: Vec<ScheduleItem>,
    cursor: usize,
}

impl VecItemSource {
    pub fn new(items: Vec<ScheduleItem>) -> Self {
        Self { items, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl PagedItemSource for VecItemSource {
    async fn fetch_next(
        &mut self,
        count: usize,
        filters: &FeedFilters,
    ) -> Result<ItemPage, StoreError> {
        let mut items = Vec::with_capacity(count);
        while items.len() < count && self.cursor < self.items.len() {
            let item = &self.items[self.cursor];
            self.cursor += 1;
            if filters.matches(item) {
                items.push(item.clone());
            }
        }
        Ok(ItemPage {
            items,
            has_more: self.cursor < self.items.len(),
        })
    }

    async fn reset(&mut self) -> Result<(), StoreError> {
        self.cursor = 0;
        Ok(())
    }
}
