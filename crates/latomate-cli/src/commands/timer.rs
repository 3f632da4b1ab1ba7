use std::collections::BTreeSet;
use std::time::Duration;

use clap::Subcommand;
use latomate_core::{Config, SessionType, TimerService};

use super::{open_reconciler, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session (defaults to the armed type and the mode's length)
    Start {
        /// work, short-break or long-break
        #[arg(long = "type", value_name = "TYPE")]
        session_type: Option<SessionType>,
        /// Session length in minutes
        #[arg(long, conflicts_with = "seconds")]
        minutes: Option<u64>,
        /// Session length in seconds
        #[arg(long)]
        seconds: Option<u64>,
        /// Tag to attach (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Pause the running session
    Pause,
    /// Resume the paused session
    Resume,
    /// Interrupt the active session; press twice while idle to clear the count
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Run one reconciliation tick
    Tick,
    /// Keep reconciling until Ctrl-C
    Watch {
        /// Tick period, defaults to watch.tick_interval_ms
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

pub fn run(action: TimerAction, config: &Config) -> CmdResult {
    match action {
        TimerAction::Start {
            session_type,
            minutes,
            seconds,
            tags,
        } => {
            let service = reconciled_service(config)?;
            let tags: BTreeSet<String> = tags.into_iter().collect();
            let length = seconds.or(minutes.map(|m| m.saturating_mul(60)));
            let event = match (session_type, length) {
                (None, None) => service.start(tags)?,
                (session_type, length) => {
                    let session_type = match session_type {
                        Some(t) => t,
                        None => service.state()?.session_type(),
                    };
                    let secs = match length {
                        Some(secs) => secs,
                        None => service.durations()?.seconds_for(session_type),
                    };
                    service.start_session(session_type, secs, tags)?
                }
            };
            print_json(&event)?;
        }
        TimerAction::Pause => print_json(&reconciled_service(config)?.pause()?)?,
        TimerAction::Resume => print_json(&reconciled_service(config)?.resume()?)?,
        TimerAction::Reset => print_json(&reconciled_service(config)?.reset()?)?,
        TimerAction::Status => {
            // A status read doubles as a reconciliation pass.
            let reconciler = open_reconciler(config)?;
            if let Some(event) = reconciler.tick_logged().completed {
                print_json(&event)?;
            }
            print_json(&reconciler.service().snapshot()?)?;
        }
        TimerAction::Tick => {
            let reconciler = open_reconciler(config)?;
            match reconciler.tick()? {
                Some(event) => print_json(&event)?,
                None => print_json(&reconciler.service().snapshot()?)?,
            }
        }
        TimerAction::Watch { interval_ms } => {
            let period = Duration::from_millis(
                interval_ms
                    .unwrap_or(config.watch.tick_interval_ms)
                    .max(1),
            );
            watch(config, period)?;
        }
    }
    Ok(())
}

/// Service for a user command, after completing any session that ran out
/// before the command arrived.
fn reconciled_service(config: &Config) -> Result<TimerService, Box<dyn std::error::Error>> {
    let reconciler = open_reconciler(config)?;
    if let Some(event) = reconciler.tick_logged().completed {
        print_json(&event)?;
    }
    Ok(reconciler.service().clone())
}

fn watch(config: &Config, period: Duration) -> CmdResult {
    let reconciler = open_reconciler(config)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    tracing::info!(period_ms = period.as_millis() as u64, "watching timer");
    let mut last_badge = None;
    runtime.block_on(reconciler.run_until(
        period,
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        },
        |report| {
            if let Some(event) = &report.completed {
                if let Err(e) = print_json(event) {
                    tracing::warn!(error = %e, "could not print event");
                }
            }
            if last_badge.as_ref() != Some(&report.badge) {
                match serde_json::to_string(&report.badge) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "could not print badge"),
                }
                last_badge = Some(report.badge.clone());
            }
        },
    ));
    Ok(())
}
