use chrono::{Local, Utc};
use clap::Subcommand;
use latomate_core::{Config, StatsAnalyzer};

use super::{open_service, print_json, CmdResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today, this week, this month, all time and the current streak
    Overview,
    /// Completed pomodoros per day, oldest first
    Activity {
        /// Days to cover, today included (1-366)
        #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=366))]
        days: u32,
    },
}

pub fn run(action: StatsAction, config: &Config) -> CmdResult {
    let service = open_service(config)?;
    let sessions = service.sessions().all()?;
    let stats = StatsAnalyzer::new(Local);
    let now = Utc::now();

    match action {
        StatsAction::Overview => print_json(&stats.overview(&sessions, now))?,
        StatsAction::Activity { days } => print_json(&stats.daily_activity(&sessions, now, days))?,
    }
    Ok(())
}
