use std::path::PathBuf;
use std::sync::Arc;

use clap::Subcommand;
use cyclefeed_core::feed::DismissedCache;
use cyclefeed_core::{Config, Database, FeedEngine, FeedEntry, FixedClock, SqliteItemSource};
use tracing::info;

use super::fixture::{parse_instant, Fixture};

#[derive(Subcommand)]
pub enum FeedAction {
    /// Load a fixture's items into the feed database, replacing earlier ones
    Import {
        /// Fixture JSON file
        fixture: PathBuf,
    },
    /// Fetch the first page(s) of the feed
    List {
        /// Fixture JSON file (program, cycle and meal plan)
        fixture: PathBuf,
        /// Items to fetch (default: feed.page_size)
        #[arg(long)]
        count: Option<usize>,
        /// Preview the feed as of this period index
        #[arg(long)]
        offset: Option<i32>,
        /// Free-text filter
        #[arg(long)]
        search: Option<String>,
        /// RFC 3339 timestamp used as "now" (default: current time)
        #[arg(long)]
        at: Option<String>,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Hide an item from the feed permanently
    Dismiss {
        /// Item id
        id: String,
    },
}

pub fn run(action: FeedAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_async(action, config))
}

async fn run_async(
    action: FeedAction,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open(&config.database.file_name)?);

    match action {
        FeedAction::Import { fixture } => {
            let fixture = Fixture::load(&fixture)?;
            let count = db.import_items(&fixture.items)?;
            info!(count, "items imported");
            println!("imported {count} items");
        }
        FeedAction::List {
            fixture,
            count,
            offset,
            search,
            at,
            json,
        } => {
            let fixture = Fixture::load(&fixture)?;
            let mut engine = FeedEngine::new(
                fixture.program,
                fixture.cycle,
                fixture.meal_plan,
                Box::new(SqliteItemSource::new(Arc::clone(&db))),
                Box::new(Arc::clone(&db)),
            )
            .with_viewer_offset(config.viewer_offset()?)
            .with_dismissed_key(config.feed.dismissed_key.clone());
            if let Some(at) = at.as_deref() {
                engine = engine.with_clock(Box::new(FixedClock(parse_instant(at)?)));
            }
            if let Some(offset) = offset {
                engine.set_period_offset(offset);
            }
            engine.set_search(search);

            engine.reset().await?;
            engine.fetch(count.unwrap_or(config.feed.page_size)).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(engine.entries())?);
            } else {
                for entry in engine.entries() {
                    print_entry(&engine, entry);
                }
            }
        }
        FeedAction::Dismiss { id } => {
            let mut dismissed = DismissedCache::new(config.feed.dismissed_key.clone());
            if dismissed.dismiss(db.as_ref(), &id).await? {
                println!("dismissed {id}");
            } else {
                println!("{id} was already dismissed");
            }
        }
    }
    Ok(())
}

fn print_entry(engine: &FeedEngine, entry: &FeedEntry) {
    match entry {
        FeedEntry::MealPlan(card) => {
            let name = card.meal_plan.name.as_deref().unwrap_or(&card.meal_plan.id);
            let next = if card.next_period_accessible {
                "open"
            } else {
                "locked"
            };
            println!(
                "{}  meal plan {name} (period {}, day {}, next period {next})",
                entry.id(),
                card.period_index,
                card.day_index
            );
        }
        FeedEntry::Scheduled(item) => {
            let when = item
                .effective_instant()
                .map(|instant| engine.schedule().to_local(instant).to_string())
                .unwrap_or_else(|| "unscheduled".to_string());
            println!("{}  {when}  [{}]", item.id, item.feed_format);
        }
    }
}
