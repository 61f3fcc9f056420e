use std::path::PathBuf;

use clap::Subcommand;
use cyclefeed_core::{
    add_items_to_schedule, build_schedule, Config, FeedEngine, FixedClock, MemoryKeyValueStore,
    Schedule, VecItemSource,
};

use super::fixture::{parse_instant, Fixture};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Build the period calendar of a fixture and place its items
    Build {
        /// Fixture JSON file
        fixture: PathBuf,
        /// Print the schedule as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show which period and day an instant falls on
    Locate {
        /// Fixture JSON file
        fixture: PathBuf,
        /// RFC 3339 timestamp (default: now)
        #[arg(long)]
        at: Option<String>,
    },
}

pub fn run(action: ScheduleAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let offset = config.viewer_offset()?;

    match action {
        ScheduleAction::Build { fixture, json } => {
            let fixture = Fixture::load(&fixture)?;
            let mut schedule =
                build_schedule(&fixture.program, &fixture.cycle).with_viewer_offset(offset);
            add_items_to_schedule(&mut schedule, fixture.items)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&schedule)?);
            } else {
                print_schedule(&schedule);
            }
        }
        ScheduleAction::Locate { fixture, at } => {
            let fixture = Fixture::load(&fixture)?;
            let at = at.as_deref().map(parse_instant).transpose()?;

            let mut engine = FeedEngine::new(
                fixture.program,
                fixture.cycle,
                fixture.meal_plan,
                Box::new(VecItemSource::default()),
                Box::new(MemoryKeyValueStore::new()),
            )
            .with_viewer_offset(offset);
            if let Some(at) = at {
                engine = engine.with_clock(Box::new(FixedClock(at)));
            }

            let position = engine.get_period_day_indexes(None);
            println!(
                "period_index={} day_index={}",
                position.period_index, position.day_index
            );
            if let Some(period) = engine.schedule().period(position.period_index) {
                println!("{}", period.name);
            }
        }
    }
    Ok(())
}

fn print_schedule(schedule: &Schedule) {
    for period in &schedule.periods {
        println!(
            "[{}] {}  {} .. {}",
            period.index,
            period.name,
            period.start.date(),
            period.end.date()
        );
        let mut days: Vec<_> = period.days.iter().collect();
        days.sort_by(|a, b| a.key.cmp(&b.key));
        for day in days {
            let ids: Vec<_> = day.items.iter().map(|i| i.id.as_str()).collect();
            println!("    {}  {}", day.key, ids.join(", "));
        }
    }
    if !schedule.unscheduled_items.is_empty() {
        let ids: Vec<_> = schedule
            .unscheduled_items
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        println!("unscheduled: {}", ids.join(", "));
    }
}
