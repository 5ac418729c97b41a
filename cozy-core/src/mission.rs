//! Mission timer.
//!
//! A mission is a start timestamp plus a duration. Nothing pushes
//! completion: callers poll [`MissionTimer::progress`] (the web layer on a
//! 100 ms tick) and complete the mission themselves once the remaining time
//! reaches zero.

use serde::{Deserialize, Serialize};

use crate::KeyValueStore;
use crate::clock::Clock;
use crate::constants::MS_PER_MINUTE;
use crate::error::{CozyError, CozyResult};
use crate::storage::CozyRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    #[default]
    Idle,
    Waiting,
    Completed,
}

impl MissionStatus {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "idle" => Some(Self::Idle),
            "waiting" => Some(Self::Waiting),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DurationPreset {
    pub label: &'static str,
    pub minutes: u32,
}

/// Mission lengths offered on the home screen.
pub const DURATION_PRESETS: [DurationPreset; 3] = [
    DurationPreset {
        label: "15m",
        minutes: 15,
    },
    DurationPreset {
        label: "1h",
        minutes: 60,
    },
    DurationPreset {
        label: "4h",
        minutes: 240,
    },
];

/// Snapshot of a running mission at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionProgress {
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
    pub duration_ms: u64,
}

impl MissionProgress {
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.remaining_ms == 0
    }

    /// Completion in percent, capped at 100.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.duration_ms == 0 {
            return 100.0;
        }
        (self.elapsed_ms as f64 / self.duration_ms as f64 * 100.0).min(100.0)
    }

    /// Remaining time as `HH:MM:SS`, rounded down to whole seconds.
    #[must_use]
    pub fn countdown_label(&self) -> String {
        let total_secs = self.remaining_ms / 1_000;
        let hours = total_secs / 3_600;
        let minutes = (total_secs / 60) % 60;
        let seconds = total_secs % 60;
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

/// Pure progress computation. A `now` before `start` counts as zero elapsed.
#[must_use]
pub fn compute_progress(start_ms: i64, duration_ms: u64, now_ms: i64) -> MissionProgress {
    let elapsed_ms = u64::try_from(now_ms.saturating_sub(start_ms)).unwrap_or(0);
    MissionProgress {
        elapsed_ms,
        remaining_ms: duration_ms.saturating_sub(elapsed_ms),
        duration_ms,
    }
}

/// Convert a requested length in minutes to whole milliseconds.
///
/// # Errors
///
/// Returns [`CozyError::InvalidDuration`] for non-finite values and for
/// lengths that round to zero milliseconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn minutes_to_ms(minutes: f64) -> CozyResult<u64> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(CozyError::InvalidDuration(minutes));
    }
    let ms = (minutes * MS_PER_MINUTE).round();
    if ms < 1.0 || ms >= u64::MAX as f64 {
        return Err(CozyError::InvalidDuration(minutes));
    }
    Ok(ms as u64)
}

/// Timer view over the persisted mission record.
pub struct MissionTimer<'a, S: KeyValueStore, C: Clock> {
    repo: &'a CozyRepository<S>,
    clock: &'a C,
}

impl<'a, S: KeyValueStore, C: Clock> MissionTimer<'a, S, C> {
    pub const fn new(repo: &'a CozyRepository<S>, clock: &'a C) -> Self {
        Self { repo, clock }
    }

    /// Current status. A stored `waiting` with no readable start time breaks
    /// the record's invariant and reads as `idle`.
    #[must_use]
    pub fn status(&self) -> MissionStatus {
        match self.repo.mission_status() {
            MissionStatus::Waiting if self.repo.mission_start_ms().is_none() => {
                log::warn!("mission marked waiting without a start time, treating as idle");
                MissionStatus::Idle
            }
            status => status,
        }
    }

    #[must_use]
    pub fn start_time_ms(&self) -> Option<i64> {
        self.repo.mission_start_ms()
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.repo.mission_duration_ms()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_minutes(&self) -> f64 {
        self.duration_ms() as f64 / MS_PER_MINUTE
    }

    /// Begin a mission now. A mission already waiting is overwritten.
    /// Returns the start timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`CozyError::InvalidDuration`] or a storage error.
    pub fn start(&self, duration_minutes: f64) -> CozyResult<i64> {
        let duration_ms = minutes_to_ms(duration_minutes)?;
        let now = self.clock.now_ms();
        if self.repo.mission_status() == MissionStatus::Waiting {
            log::debug!("restarting mission that was still waiting");
        }
        self.repo.set_mission_start_ms(now)?;
        self.repo.set_mission_status(MissionStatus::Waiting)?;
        self.repo.set_mission_duration_ms(duration_ms)?;
        log::info!("mission started for {duration_ms} ms at {now}");
        Ok(now)
    }

    /// Progress at the clock's current time, `None` unless waiting.
    #[must_use]
    pub fn progress(&self) -> Option<MissionProgress> {
        if self.status() != MissionStatus::Waiting {
            return None;
        }
        let start = self.repo.mission_start_ms()?;
        Some(compute_progress(
            start,
            self.duration_ms(),
            self.clock.now_ms(),
        ))
    }

    /// Mark the mission completed and drop the start time. Safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn complete(&self) -> CozyResult<()> {
        self.repo.set_mission_status(MissionStatus::Completed)?;
        self.repo.clear_mission_start()?;
        log::info!("mission completed");
        Ok(())
    }

    /// Back to idle. The duration record is left in place; the next start
    /// overwrites it.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn reset(&self) -> CozyResult<()> {
        self.repo.set_mission_status(MissionStatus::Idle)?;
        self.repo.clear_mission_start()?;
        log::debug!("mission reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;

    const T0: i64 = 1_700_000_000_000;

    fn fixture() -> (CozyRepository<MemoryStore>, ManualClock) {
        (CozyRepository::new(MemoryStore::new()), ManualClock::new(T0))
    }

    #[test]
    fn progress_is_pure_and_clamped() {
        let p = compute_progress(T0, 60_000, T0 + 15_000);
        assert_eq!(p.elapsed_ms, 15_000);
        assert_eq!(p.remaining_ms, 45_000);
        assert!((p.percent() - 25.0).abs() < f64::EPSILON);
        assert!(!p.is_finished());

        let late = compute_progress(T0, 60_000, T0 + 90_000);
        assert_eq!(late.remaining_ms, 0);
        assert!((late.percent() - 100.0).abs() < f64::EPSILON);
        assert!(late.is_finished());

        let skewed = compute_progress(T0, 60_000, T0 - 5_000);
        assert_eq!(skewed.elapsed_ms, 0);
        assert_eq!(skewed.remaining_ms, 60_000);
    }

    #[test]
    fn countdown_label_formats_hours_minutes_seconds() {
        let p = compute_progress(T0, 4 * 3_600_000, T0 + 1_500);
        assert_eq!(p.countdown_label(), "03:59:58");
        assert_eq!(compute_progress(T0, 1, T0 + 1).countdown_label(), "00:00:00");
    }

    #[test]
    fn rejects_unusable_durations() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e-9] {
            assert!(matches!(
                minutes_to_ms(bad),
                Err(CozyError::InvalidDuration(_))
            ));
        }
        assert_eq!(minutes_to_ms(0.5).unwrap(), 30_000);
        assert_eq!(minutes_to_ms(15.0).unwrap(), 900_000);
    }

    #[test]
    fn lifecycle_idle_waiting_completed_idle() {
        let (repo, clock) = fixture();
        let timer = MissionTimer::new(&repo, &clock);
        assert_eq!(timer.status(), MissionStatus::Idle);
        assert_eq!(timer.progress(), None);

        assert_eq!(timer.start(15.0).unwrap(), T0);
        assert_eq!(timer.status(), MissionStatus::Waiting);
        assert_eq!(timer.start_time_ms(), Some(T0));
        assert_eq!(timer.duration_ms(), 900_000);

        clock.advance_minutes(15.0);
        let progress = timer.progress().unwrap();
        assert!(progress.is_finished());

        timer.complete().unwrap();
        assert_eq!(timer.status(), MissionStatus::Completed);
        assert_eq!(timer.start_time_ms(), None);
        timer.complete().unwrap();
        assert_eq!(timer.status(), MissionStatus::Completed);

        timer.reset().unwrap();
        assert_eq!(timer.status(), MissionStatus::Idle);
        assert_eq!(timer.duration_ms(), 900_000, "duration is left stale");
    }

    #[test]
    fn restart_overwrites_running_mission() {
        let (repo, clock) = fixture();
        let timer = MissionTimer::new(&repo, &clock);
        timer.start(60.0).unwrap();
        clock.advance_ms(5_000);
        timer.start(15.0).unwrap();
        assert_eq!(timer.start_time_ms(), Some(T0 + 5_000));
        assert_eq!(timer.progress().unwrap().remaining_ms, 900_000);
    }

    #[test]
    fn waiting_without_start_reads_as_idle() {
        let (repo, clock) = fixture();
        repo.set_mission_status(MissionStatus::Waiting).unwrap();
        let timer = MissionTimer::new(&repo, &clock);
        assert_eq!(timer.status(), MissionStatus::Idle);
        assert_eq!(timer.progress(), None);
    }

    #[test]
    fn suspended_tab_catches_up() {
        let (repo, clock) = fixture();
        let timer = MissionTimer::new(&repo, &clock);
        timer.start(1.0).unwrap();
        clock.advance_ms(45_000);
        assert_eq!(timer.progress().unwrap().remaining_ms, 15_000);
        clock.advance_ms(3_600_000);
        assert!(timer.progress().unwrap().is_finished());
    }
}
