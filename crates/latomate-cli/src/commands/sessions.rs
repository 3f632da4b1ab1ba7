use chrono::{Local, NaiveDate, NaiveTime, Utc};
use clap::Subcommand;
use latomate_core::{Config, SessionFilter, SessionType, TimerMode};
use serde_json::json;

use super::{open_service, print_json, CmdResult};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List recorded sessions, newest first
    List {
        /// Only this session type
        #[arg(long = "type", value_name = "TYPE")]
        session_type: Option<SessionType>,
        /// Only sessions run in this timer mode
        #[arg(long)]
        mode: Option<TimerMode>,
        /// Only completed (true) or not completed (false) sessions
        #[arg(long)]
        completed: Option<bool>,
        /// Only sessions started on or after this local date (YYYY-MM-DD)
        #[arg(long)]
        since: Option<NaiveDate>,
        /// Maximum number of sessions to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one session
    Show { id: String },
    /// Delete one session
    Delete { id: String },
    /// Delete every session
    Clear,
    /// Delete sessions older than N months
    Cleanup {
        #[arg(long, default_value = "6")]
        months: u32,
    },
    /// Count sessions and report storage size
    Count,
}

pub fn run(action: SessionsAction, config: &Config) -> CmdResult {
    let service = open_service(config)?;
    let sessions = service.sessions();

    match action {
        SessionsAction::List {
            session_type,
            mode,
            completed,
            since,
            limit,
        } => {
            let filter = SessionFilter {
                session_type,
                timer_mode: mode,
                completed,
                start_date: since.map(local_midnight).transpose()?,
                end_date: None,
            };
            let mut list = sessions.list(&filter)?;
            if let Some(limit) = limit {
                list.truncate(limit);
            }
            print_json(&list)?;
        }
        SessionsAction::Show { id } => match sessions.get(&id)? {
            Some(record) => print_json(&record)?,
            None => return Err(format!("session not found: {id}").into()),
        },
        SessionsAction::Delete { id } => {
            if !sessions.delete(&id)? {
                return Err(format!("session not found: {id}").into());
            }
            print_json(&json!({ "deleted": id }))?;
        }
        SessionsAction::Clear => {
            let deleted = sessions.delete_all()?;
            print_json(&json!({ "deleted": deleted }))?;
        }
        SessionsAction::Cleanup { months } => {
            let removed = sessions.cleanup_older_than(months, Utc::now())?;
            print_json(&json!({ "removed": removed, "months": months }))?;
        }
        SessionsAction::Count => {
            print_json(&json!({
                "count": sessions.count()?,
                "storage_bytes": sessions.storage_size_bytes()?,
            }))?;
        }
    }
    Ok(())
}

fn local_midnight(date: NaiveDate) -> Result<chrono::DateTime<Utc>, String> {
    date.and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("no local midnight on {date}"))
}
