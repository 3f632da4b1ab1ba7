//! End-to-end timer scenarios against the in-memory store and a SQLite file.
//!
//! Each scenario drives a `TimerService` and a `Reconciler` with a manual
//! clock, the same way the CLI and its watch loop share one store.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use latomate_core::error::StoreError;
use latomate_core::notify::RecordingNotifier;
use latomate_core::storage::{keys, StoreChange};
use latomate_core::timer::{badge, format_clock};
use latomate_core::{
    Clock, CoreError, Database, Event, KeyValueStore, ManualClock, MemoryStore, Reconciler,
    SessionFilter, SessionType, TimerService, TimerStatus,
};
use tokio::sync::broadcast;

struct Harness {
    service: TimerService,
    reconciler: Reconciler,
    clock: Arc<ManualClock>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(store: Arc<dyn KeyValueStore>, start_ms: u64) -> Harness {
    let clock = Arc::new(ManualClock::new(start_ms));
    let notifier = Arc::new(RecordingNotifier::new());
    let service = TimerService::new(store, clock.clone());
    Harness {
        reconciler: Reconciler::new(service.clone(), notifier.clone()),
        service,
        clock,
        notifier,
    }
}

fn with_each_store(scenario: fn(Arc<dyn KeyValueStore>)) {
    scenario(Arc::new(MemoryStore::new()));

    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("latomate.db")).unwrap();
    scenario(Arc::new(db));
}

fn complete_current(h: &Harness) -> Event {
    let end = h.service.state().unwrap().end_time_ms().unwrap();
    h.clock.set(end);
    h.reconciler.tick().unwrap().expect("deadline reached")
}

fn four_pomodoro_cycle(store: Arc<dyn KeyValueStore>) {
    let h = harness(store, 1_750_000_000_000);
    let expected_breaks = [
        SessionType::ShortBreak,
        SessionType::ShortBreak,
        SessionType::ShortBreak,
        SessionType::LongBreak,
    ];

    for (i, expected_break) in expected_breaks.iter().enumerate() {
        let started = h.service.start(BTreeSet::new()).unwrap();
        assert!(matches!(
            started,
            Event::SessionStarted {
                session_type: SessionType::Work,
                duration_secs: 1500,
                ..
            }
        ));
        let Event::SessionCompleted {
            next_session_type,
            completed_pomodoros,
            ..
        } = complete_current(&h)
        else {
            panic!("expected SessionCompleted");
        };
        assert_eq!(completed_pomodoros, i as u32 + 1);
        assert_eq!(next_session_type, *expected_break);

        let state = h.service.state().unwrap();
        assert_eq!(state.status(), TimerStatus::Idle);
        assert_eq!(state.session_type(), *expected_break);

        let Event::SessionStarted { duration_secs, .. } = h.service.start(BTreeSet::new()).unwrap()
        else {
            panic!("expected SessionStarted");
        };
        let expected_secs = if *expected_break == SessionType::LongBreak { 900 } else { 300 };
        assert_eq!(duration_secs, expected_secs);
        let Event::SessionCompleted {
            next_session_type, ..
        } = complete_current(&h)
        else {
            panic!("expected SessionCompleted");
        };
        assert_eq!(next_session_type, SessionType::Work);
    }

    assert_eq!(h.service.state().unwrap().completed_pomodoros(), 4);
    let sessions = h.service.sessions().all().unwrap();
    assert_eq!(sessions.len(), 8);
    assert!(sessions.iter().all(|s| s.completed && !s.interrupted));
    assert_eq!(h.notifier.sent().len(), 8);
}

#[test]
fn test_four_pomodoro_cycle() {
    with_each_store(four_pomodoro_cycle);
}

fn countdown_boundaries(store: Arc<dyn KeyValueStore>) {
    let t = 1_000_000;
    let h = harness(store, t);
    h.service
        .start_session(SessionType::Work, 1500, BTreeSet::new())
        .unwrap();

    let state = h.service.state().unwrap();
    assert_eq!(state.end_time_ms(), Some(t + 1_500_000));
    assert_eq!(state.remaining_secs(t), Some(1500));
    assert_eq!(format_clock(1500), "25:00");
    assert_eq!(badge(&state, t).text, "25m");

    assert_eq!(state.remaining_secs(t + 1_498_999), Some(2));
    assert_eq!(badge(&state, t + 1_498_999).text, "2s");
    assert_eq!(state.remaining_secs(t + 1_499_999), Some(1));

    h.clock.set(t + 1_499_999);
    assert!(h.reconciler.tick().unwrap().is_none());
    assert!(h.service.state().unwrap().is_running());

    h.clock.set(t + 1_500_000);
    assert!(h.reconciler.tick().unwrap().is_some());
    let state = h.service.state().unwrap();
    assert!(state.is_idle());
    assert_eq!(state.session_type(), SessionType::ShortBreak);
    assert_eq!(badge(&state, t + 1_500_000).text, "");
}

#[test]
fn test_countdown_boundaries() {
    with_each_store(countdown_boundaries);
}

fn record_round_trip(store: Arc<dyn KeyValueStore>) {
    let h = harness(store, 1_750_000_000_000);
    let tags = BTreeSet::from(["tag_1".to_string(), "tag_2".to_string()]);
    h.service
        .start_session(SessionType::Work, 600, tags.clone())
        .unwrap();
    let id = h
        .service
        .state()
        .unwrap()
        .current_session_id()
        .unwrap()
        .to_string();
    h.clock.advance(120_000);
    h.service.interrupt_session().unwrap();

    let stored = h.service.sessions().get(&id).unwrap().unwrap();
    assert!(stored.interrupted);
    assert!(!stored.completed);
    assert_eq!(stored.duration, 600);
    assert_eq!(stored.tags, tags);
    assert_eq!(
        stored.end_time.timestamp_millis() - stored.start_time.timestamp_millis(),
        120_000
    );

    let interrupted = h
        .service
        .sessions()
        .list(&SessionFilter::default().completed(false))
        .unwrap();
    assert_eq!(interrupted.len(), 1);

    assert!(h.service.sessions().delete(&id).unwrap());
    assert!(h.service.sessions().get(&id).unwrap().is_none());
    assert_eq!(h.service.sessions().count().unwrap(), 0);
}

#[test]
fn test_record_round_trip_and_delete() {
    with_each_store(record_round_trip);
}

fn double_reset(store: Arc<dyn KeyValueStore>) {
    let h = harness(store, 5_000_000);
    h.service.start(BTreeSet::new()).unwrap();
    complete_current(&h);
    h.service.start(BTreeSet::new()).unwrap();
    complete_current(&h);
    assert_eq!(h.service.state().unwrap().completed_pomodoros(), 1);

    // First press arms, a press after the window re-arms.
    let now = h.clock.now_ms();
    assert!(matches!(h.service.reset().unwrap(), Event::ResetArmed { .. }));
    h.clock.set(now + 2_000);
    assert!(matches!(h.service.reset().unwrap(), Event::ResetArmed { .. }));
    assert_eq!(h.service.state().unwrap().completed_pomodoros(), 1);

    // Second press inside the window clears the count.
    h.clock.set(now + 3_999);
    assert!(matches!(h.service.reset().unwrap(), Event::Reinitialized { .. }));
    let state = h.service.state().unwrap();
    assert_eq!(state.completed_pomodoros(), 0);
    assert_eq!(state.session_type(), SessionType::Work);

    // The window is consumed.
    assert!(matches!(h.service.reset().unwrap(), Event::ResetArmed { .. }));
}

#[test]
fn test_double_reset() {
    with_each_store(double_reset);
}

fn duplicate_ticks(store: Arc<dyn KeyValueStore>) {
    let h = harness(store.clone(), 0);
    let second = harness(store, 0);
    h.service
        .start_session(SessionType::Work, 60, BTreeSet::new())
        .unwrap();
    h.clock.set(61_000);
    second.clock.set(61_500);

    assert!(h.reconciler.tick().unwrap().is_some());
    assert!(second.reconciler.tick().unwrap().is_none());
    assert!(h.reconciler.tick().unwrap().is_none());

    assert_eq!(h.service.state().unwrap().completed_pomodoros(), 1);
    assert_eq!(h.notifier.sent().len(), 1);
    assert!(second.notifier.sent().is_empty());
    let record = &h.service.sessions().all().unwrap()[0];
    assert_eq!(record.end_time.timestamp_millis(), 61_000);
}

#[test]
fn test_duplicate_ticks_complete_once() {
    with_each_store(duplicate_ticks);
}

#[test]
fn test_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latomate.db");
    {
        let h = harness(Arc::new(Database::open_at(&path).unwrap()), 10_000);
        h.service
            .start_session(SessionType::Work, 60, BTreeSet::from(["deep".to_string()]))
            .unwrap();
        h.clock.advance(15_000);
        h.service.pause().unwrap();
    }

    let h = harness(Arc::new(Database::open_at(&path).unwrap()), 900_000);
    let state = h.service.state().unwrap();
    assert!(state.is_paused());
    assert_eq!(state.remaining_secs(900_000), Some(45));
    h.service.resume().unwrap();
    assert_eq!(h.service.state().unwrap().end_time_ms(), Some(945_000));
    assert_eq!(h.service.sessions().count().unwrap(), 1);
}

#[test]
fn test_store_changes_are_broadcast() {
    let store = Arc::new(MemoryStore::new());
    let mut changes = store.subscribe();
    let h = harness(store, 0);
    h.service
        .start_session(SessionType::Work, 60, BTreeSet::new())
        .unwrap();

    let mut seen = Vec::new();
    while let Ok(change) = changes.try_recv() {
        seen.push(change.key);
    }
    assert!(seen.contains(&keys::SESSIONS.to_string()));
    assert!(seen.contains(&keys::TIMER_STATE.to_string()));
}

/// A store whose every operation fails.
struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Locked)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Locked)
    }

    fn remove(&self, _key: &str) -> Result<(), StoreError> {
        Err(StoreError::Locked)
    }

    fn compare_and_swap(
        &self,
        _key: &str,
        _expected: Option<&str>,
        _new: &str,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Locked)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        broadcast::channel(1).1
    }
}

#[test]
fn test_failing_store_does_not_break_the_tick() {
    let h = harness(Arc::new(BrokenStore), 0);
    assert!(h.reconciler.tick().is_err());
    assert!(h.service.start(BTreeSet::new()).is_err());

    let report = h.reconciler.tick_logged();
    assert!(report.completed.is_none());
    assert!(report.badge.text.is_empty());
}

/// In-memory store whose next write to the session list fails once armed.
#[derive(Default)]
struct FlakySessions {
    inner: MemoryStore,
    fail_next: AtomicBool,
}

impl KeyValueStore for FlakySessions {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == keys::SESSIONS && self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Locked);
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StoreError> {
        self.inner.compare_and_swap(key, expected, new)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.inner.subscribe()
    }
}

#[test]
fn test_failed_record_write_is_retried_by_next_tick() {
    let store = Arc::new(FlakySessions::default());
    let h = harness(store.clone(), 50_000);
    h.service
        .start_session(SessionType::Work, 60, BTreeSet::new())
        .unwrap();
    let id = h.service.state().unwrap().current_session_id().unwrap().to_string();
    h.clock.advance(60_000);

    store.fail_next.store(true, Ordering::SeqCst);
    assert!(h.reconciler.tick().is_err());
    let state = h.service.state().unwrap();
    assert!(state.is_running());
    assert_eq!(state.completed_pomodoros(), 0);
    assert!(h.service.sessions().get(&id).unwrap().unwrap().is_pending());
    assert!(h.notifier.sent().is_empty());

    assert!(h.reconciler.tick().unwrap().is_some());
    let state = h.service.state().unwrap();
    assert!(state.is_idle());
    assert_eq!(state.completed_pomodoros(), 1);
    assert!(h.service.sessions().get(&id).unwrap().unwrap().completed);
    assert_eq!(h.notifier.sent().len(), 1);
    assert!(h.reconciler.tick().unwrap().is_none());
}

#[test]
fn test_failed_record_write_keeps_interrupt_retryable() {
    let store = Arc::new(FlakySessions::default());
    let h = harness(store.clone(), 50_000);
    h.service
        .start_session(SessionType::Work, 60, BTreeSet::new())
        .unwrap();
    let id = h.service.state().unwrap().current_session_id().unwrap().to_string();
    h.clock.advance(10_000);

    store.fail_next.store(true, Ordering::SeqCst);
    assert!(h.service.reset().is_err());
    assert!(h.service.state().unwrap().is_running());

    assert!(matches!(
        h.service.reset().unwrap(),
        Event::SessionInterrupted { .. }
    ));
    assert!(h.service.state().unwrap().is_idle());
    assert!(h.service.sessions().get(&id).unwrap().unwrap().interrupted);
}

fn reset_after_deadline(store: Arc<dyn KeyValueStore>) {
    let h = harness(store, 1_000_000);
    h.service
        .start_session(SessionType::Work, 1, BTreeSet::new())
        .unwrap();
    let id = h.service.state().unwrap().current_session_id().unwrap().to_string();
    h.clock.advance(5_000);

    assert!(matches!(
        h.service.reset(),
        Err(CoreError::SessionExpired { .. })
    ));
    assert!(h.reconciler.tick().unwrap().is_some());
    let record = h.service.sessions().get(&id).unwrap().unwrap();
    assert!(record.completed);
    assert!(!record.interrupted);
    assert_eq!(h.service.state().unwrap().completed_pomodoros(), 1);

    assert!(matches!(h.service.reset().unwrap(), Event::ResetArmed { .. }));
    assert!(h.service.sessions().get(&id).unwrap().unwrap().completed);
}

#[test]
fn test_reset_after_deadline_yields_completed_record() {
    with_each_store(reset_after_deadline);
}
