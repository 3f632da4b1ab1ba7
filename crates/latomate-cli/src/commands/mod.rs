pub mod config;
pub mod mode;
pub mod sessions;
pub mod stats;
pub mod timer;

use std::sync::Arc;

use latomate_core::timer::ResetGuard;
use latomate_core::{Config, Database, Reconciler, SystemClock, TimerService};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Service over the on-disk store with the wall clock.
pub fn open_service(config: &Config) -> Result<TimerService, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(TimerService::new(Arc::new(db), Arc::new(SystemClock))
        .with_reset_guard(ResetGuard::new(config.watch.reset_confirm_window_ms)))
}

pub fn open_reconciler(config: &Config) -> Result<Reconciler, Box<dyn std::error::Error>> {
    Ok(Reconciler::new(
        open_service(config)?,
        crate::notifier::from_config(config),
    ))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
