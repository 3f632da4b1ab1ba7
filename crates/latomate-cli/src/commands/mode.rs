use clap::{Subcommand, ValueEnum};
use latomate_core::{Config, TimerDurations, TimerMode};
use serde_json::json;

use super::{open_service, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ModeAction {
    /// Print the active mode and its durations
    Get,
    /// Switch mode: pomodoro, intensive, 52-17 or custom
    Set { mode: TimerMode },
    /// Print the durations of every mode
    Durations,
    /// Save custom durations (minutes, interval in work sessions)
    Custom {
        work: u32,
        short_break: u32,
        long_break: u32,
        long_break_interval: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

pub fn run(action: ModeAction, config: &Config) -> CmdResult {
    let service = open_service(config)?;

    match action {
        ModeAction::Get => {
            print_json(&json!({
                "mode": service.timer_mode()?,
                "durations": service.durations()?,
            }))?;
        }
        ModeAction::Set { mode } => {
            service.set_timer_mode(mode)?;
            print_json(&json!({ "mode": mode, "durations": service.durations()? }))?;
        }
        ModeAction::Durations => {
            let custom = service.custom_durations()?;
            let all: serde_json::Map<String, serde_json::Value> = TimerMode::ALL
                .iter()
                .map(|mode| {
                    let durations = latomate_core::timer::resolve(*mode, custom);
                    serde_json::to_value(durations).map(|v| (mode.as_str().to_string(), v))
                })
                .collect::<Result<_, _>>()?;
            print_json(&all)?;
        }
        ModeAction::Custom {
            work,
            short_break,
            long_break,
            long_break_interval,
        } => {
            let durations = TimerDurations {
                work,
                short_break,
                long_break,
                long_break_interval,
            };
            service.set_custom_durations(durations)?;
            print_json(&durations)?;
        }
    }
    Ok(())
}

pub fn notifications(toggle: Option<Toggle>, config: &Config) -> CmdResult {
    let service = open_service(config)?;
    if let Some(toggle) = toggle {
        service.set_notifications_enabled(matches!(toggle, Toggle::On))?;
    }
    print_json(&json!({ "enabled": service.notifications_enabled()? }))
}
