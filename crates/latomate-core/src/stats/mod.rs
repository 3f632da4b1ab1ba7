//! Statistics over session history.
//!
//! Calendar boundaries (today, week, month, streak days) are taken in the
//! analyzer's time zone; weeks start on Sunday.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;
use crate::timer::SessionType;

/// Widest window [`StatsAnalyzer::daily_activity`] reports.
pub const MAX_ACTIVITY_DAYS: u32 = 366;

/// Aggregates for sessions started within one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Sessions of any type and outcome
    pub total_sessions: u32,
    /// Sessions that ran to their deadline
    pub completed_sessions: u32,
    /// Completed work sessions
    pub completed_pomodoros: u32,
    /// Planned seconds of completed work sessions
    pub focus_secs: u64,
}

impl PeriodSummary {
    fn add(&mut self, record: &SessionRecord) {
        self.total_sessions += 1;
        if record.completed {
            self.completed_sessions += 1;
            if record.session_type == SessionType::Work {
                self.completed_pomodoros += 1;
                self.focus_secs += record.duration;
            }
        }
    }
}

/// Dashboard overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub today: PeriodSummary,
    pub this_week: PeriodSummary,
    pub this_month: PeriodSummary,
    pub all_time: PeriodSummary,
    /// Consecutive days ending today with at least one completed session
    pub current_streak: u32,
}

/// Completed work sessions on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub completed_pomodoros: u32,
}

/// Computes statistics in a fixed time zone.
#[derive(Debug, Clone)]
pub struct StatsAnalyzer<Tz: TimeZone> {
    tz: Tz,
}

impl<Tz: TimeZone> StatsAnalyzer<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    /// Instant of local midnight starting `date`.
    fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let naive = date.and_time(NaiveTime::MIN);
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc())
    }

    pub fn start_of_today(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.midnight(self.local_date(now))
    }

    pub fn start_of_week(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.local_date(now);
        let back = u64::from(today.weekday().num_days_from_sunday());
        self.midnight(today.checked_sub_days(Days::new(back)).unwrap_or(today))
    }

    pub fn start_of_month(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.local_date(now);
        self.midnight(today.with_day(1).unwrap_or(today))
    }

    /// Sessions started at or after `since`.
    pub fn period_summary(&self, sessions: &[SessionRecord], since: DateTime<Utc>) -> PeriodSummary {
        let mut summary = PeriodSummary::default();
        for record in sessions.iter().filter(|s| s.start_time >= since) {
            summary.add(record);
        }
        summary
    }

    pub fn current_streak(&self, sessions: &[SessionRecord], now: DateTime<Utc>) -> u32 {
        let days: BTreeSet<NaiveDate> = sessions
            .iter()
            .filter(|s| s.completed)
            .map(|s| self.local_date(s.start_time))
            .collect();

        let mut streak = 0;
        let mut day = Some(self.local_date(now));
        while let Some(d) = day.filter(|d| days.contains(d)) {
            streak += 1;
            day = d.pred_opt();
        }
        streak
    }

    /// One entry per day for the last `days` days including today, oldest
    /// first. `days` is capped at [`MAX_ACTIVITY_DAYS`].
    pub fn daily_activity(
        &self,
        sessions: &[SessionRecord],
        now: DateTime<Utc>,
        days: u32,
    ) -> Vec<DailyActivity> {
        let today = self.local_date(now);
        let mut counts: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        for offset in 0..days.min(MAX_ACTIVITY_DAYS) {
            if let Some(date) = today.checked_sub_days(Days::new(u64::from(offset))) {
                counts.insert(date, 0);
            }
        }
        for record in sessions
            .iter()
            .filter(|s| s.completed && s.session_type == SessionType::Work)
        {
            if let Some(count) = counts.get_mut(&self.local_date(record.start_time)) {
                *count += 1;
            }
        }
        counts
            .into_iter()
            .map(|(date, completed_pomodoros)| DailyActivity {
                date,
                completed_pomodoros,
            })
            .collect()
    }

    pub fn overview(&self, sessions: &[SessionRecord], now: DateTime<Utc>) -> Overview {
        Overview {
            today: self.period_summary(sessions, self.start_of_today(now)),
            this_week: self.period_summary(sessions, self.start_of_week(now)),
            this_month: self.period_summary(sessions, self.start_of_month(now)),
            all_time: self.period_summary(sessions, DateTime::<Utc>::MIN_UTC),
            current_streak: self.current_streak(sessions, now),
        }
    }
}
