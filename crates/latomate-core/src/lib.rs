//! # LaTomate Core Library
//!
//! Timer and session lifecycle for the LaTomate Pomodoro timer. Every front
//! end (the `latomate` CLI, a watch loop, an embedding UI) talks to the same
//! persisted key-value store through this crate, so several independently
//! running contexts can drive and observe one timer.
//!
//! ## Architecture
//!
//! - **Timer state machine**: a versioned record with a tagged phase. The
//!   countdown is always derived from the stored deadline and the wall clock,
//!   never from an in-memory counter.
//! - **Reconciliation**: a periodic `tick()` that completes expired sessions
//!   exactly once, even with several reconcilers on one store
//! - **Storage**: SQLite-backed key-value store with change notifications,
//!   TOML-based configuration
//! - **Session history**: pending/completed/interrupted records with
//!   retention and cleanup
//!
//! ## Key Components
//!
//! - [`TimerService`]: inbound commands (start, pause, resume, reset)
//! - [`Reconciler`]: deadline checks, completion and notifications
//! - [`SessionStore`]: session history
//! - [`Database`]: persistent store
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod notify;
pub mod reconcile;
pub mod service;
pub mod session;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use notify::{LogNotifier, Notification, NotificationKind, Notifier};
pub use reconcile::{Reconciler, TickReport};
pub use service::{Preference, TimerService};
pub use session::{SessionFilter, SessionRecord, SessionStore};
pub use stats::{DailyActivity, Overview, PeriodSummary, StatsAnalyzer};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use timer::{SessionType, TimerDurations, TimerMode, TimerState, TimerStatus};
