//! Time-tracking state machine.
//!
//! `TimeTracker` owns every piece of timing state. Commands mutate it
//! synchronously; the renderer only sees `TrackerSnapshot` copies and
//! `TrackerEvent`s. Elapsed time is always recomputed from the absolute
//! start reference, so `tick` can be called at any cadence without drift.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{TrackerError, ValidationIssue};
use crate::format::{lap_marks, LapMark, TimeComponents};
use crate::persistence::{PersistedLap, PersistedSnapshot, SnapshotStore, MAX_LAP_NUMBER};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Stopwatch,
    Countdown,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Stopwatch => Mode::Countdown,
            Mode::Countdown => Mode::Stopwatch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lap {
    /// 1-based, sequential
    pub index: u32,
    pub split_ms: u64,
    pub cumulative_ms: u64,
    /// Wall-clock time of day, display only
    pub recorded_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    Started,
    Paused,
    Reset,
    ModeChanged(Mode),
    CountdownConfigured(u64),
    LapRecorded(Lap),
    CountdownCompleted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerState {
    pub mode: Mode,
    pub phase: Phase,
    pub elapsed_ms: u64,
    pub start_reference: Option<u64>,
    /// Run time banked by earlier segments; a resumed run counts on from it
    pub paused_accumulator: u64,
    pub countdown_target_ms: u64,
    pub laps: Vec<Lap>,
    pub sound_enabled: bool,
}

impl TrackerState {
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    /// Time the clock has actually run, independent of direction
    fn run_time(&self) -> u64 {
        match self.mode {
            Mode::Stopwatch => self.elapsed_ms,
            Mode::Countdown => self.countdown_target_ms.saturating_sub(self.elapsed_ms),
        }
    }

    fn clear_progress(&mut self) {
        self.phase = Phase::Idle;
        self.elapsed_ms = 0;
        self.start_reference = None;
        self.paused_accumulator = 0;
        self.laps.clear();
    }

    fn from_persisted(snapshot: PersistedSnapshot) -> Self {
        let mut state = Self {
            mode: snapshot.mode,
            sound_enabled: snapshot.sound_enabled,
            countdown_target_ms: snapshot.countdown_target,
            ..Default::default()
        };

        match state.mode {
            Mode::Stopwatch => {
                state.elapsed_ms = snapshot.time_elapsed;
                state.laps = restore_laps(snapshot.laps, state.elapsed_ms);
            }
            Mode::Countdown => {
                let target = state.countdown_target_ms;
                state.elapsed_ms = if snapshot.time_elapsed == 0 || snapshot.time_elapsed >= target
                {
                    target
                } else {
                    snapshot.time_elapsed
                };
            }
        }

        // Partial progress resumes instead of restarting
        let run_time = state.run_time();
        if run_time > 0 && state.elapsed_ms > 0 {
            state.phase = Phase::Paused;
            state.paused_accumulator = run_time;
        }

        state
    }

    fn to_persisted(&self) -> PersistedSnapshot {
        let mut snapshot = PersistedSnapshot {
            mode: self.mode,
            time_elapsed: self.elapsed_ms,
            laps: self.laps.iter().map(PersistedLap::from).collect(),
            sound_enabled: self.sound_enabled,
            countdown_target: self.countdown_target_ms,
        };
        snapshot.truncate_laps();
        snapshot
    }
}

/// Rebuild stored laps so they agree with the restored elapsed time.
///
/// Laps past `elapsed` or running backwards are dropped and splits are
/// recomputed from the cumulative times. Stored numbering is kept only when
/// it is a consecutive run; otherwise laps are renumbered from 1.
fn restore_laps(stored: Vec<PersistedLap>, elapsed: u64) -> Vec<Lap> {
    let mut laps: Vec<Lap> = Vec::with_capacity(stored.len());
    for lap in stored.into_iter().map(Lap::from) {
        let previous = laps.last().map(|l| l.cumulative_ms);
        if lap.cumulative_ms > elapsed || previous.is_some_and(|p| lap.cumulative_ms < p) {
            continue;
        }
        laps.push(lap);
    }

    let first = laps.first().map_or(1, |l| l.index);
    let consecutive = first >= 1
        && laps
            .iter()
            .enumerate()
            .all(|(i, l)| l.index as usize == first as usize + i)
        && laps.last().map_or(true, |l| l.index <= MAX_LAP_NUMBER);
    let first = if consecutive { first } else { 1 };

    let mut previous = None;
    for (i, lap) in laps.iter_mut().enumerate() {
        lap.index = first + i as u32;
        lap.split_ms = match previous {
            Some(p) => lap.cumulative_ms - p,
            // the lap before a truncated history is gone, so its split is kept
            None if lap.index > 1 => lap.split_ms.min(lap.cumulative_ms),
            None => lap.cumulative_ms,
        };
        previous = Some(lap.cumulative_ms);
    }
    laps
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LapView {
    pub lap: Lap,
    pub mark: Option<LapMark>,
}

/// Read-only view handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSnapshot {
    pub mode: Mode,
    pub phase: Phase,
    pub running: bool,
    pub paused: bool,
    pub can_lap: bool,
    pub elapsed_ms: u64,
    pub time: TimeComponents,
    pub countdown_target_ms: u64,
    pub sound_enabled: bool,
    pub laps: Vec<LapView>,
}

type Listener = Box<dyn FnMut(&TrackerEvent)>;

pub struct TimeTracker {
    state: TrackerState,
    clock: Box<dyn Clock>,
    store: Box<dyn SnapshotStore>,
    listeners: Vec<Listener>,
    pending: Vec<TrackerEvent>,
}

impl TimeTracker {
    /// Build a tracker, rehydrating from `store` when it holds a snapshot
    pub fn new(clock: Box<dyn Clock>, store: Box<dyn SnapshotStore>) -> Self {
        let state = match store.load() {
            Some(snapshot) => {
                debug!("restoring tracker from stored snapshot");
                TrackerState::from_persisted(snapshot)
            }
            None => TrackerState::from_persisted(PersistedSnapshot::default()),
        };

        Self {
            state,
            clock,
            store,
            listeners: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.state.elapsed_ms
    }

    pub fn laps(&self) -> &[Lap] {
        &self.state.laps
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn can_lap(&self) -> bool {
        self.state.is_running() && self.state.mode == Mode::Stopwatch
    }

    /// Register an observer that sees every event as it is emitted
    pub fn subscribe(&mut self, listener: impl FnMut(&TrackerEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Take the events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<TrackerEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn start(&mut self) -> Result<(), TrackerError> {
        let now = self.clock.now_ms();
        match self.state.phase {
            Phase::Running => return Ok(()),
            Phase::Idle => {
                if self.state.mode == Mode::Countdown && self.state.countdown_target_ms == 0 {
                    return Err(TrackerError::Configuration);
                }
                self.state.elapsed_ms = match self.state.mode {
                    Mode::Stopwatch => 0,
                    Mode::Countdown => self.state.countdown_target_ms,
                };
                self.state.laps.clear();
                self.state.paused_accumulator = 0;
            }
            Phase::Paused => {}
        }

        self.state.start_reference = Some(now);
        self.state.phase = Phase::Running;
        debug!("started {} at {now}ms", self.state.mode);

        self.emit(TrackerEvent::Started);
        self.persist();
        Ok(())
    }

    pub fn pause(&mut self) {
        if !self.state.is_running() {
            return;
        }
        let now = self.clock.now_ms();
        self.tick(now);
        // the countdown may have expired at this very instant
        if !self.state.is_running() {
            return;
        }

        self.state.paused_accumulator = self.state.run_time();
        self.state.start_reference = None;
        self.state.phase = Phase::Paused;

        self.emit(TrackerEvent::Paused);
        self.persist();
    }

    /// Start when stopped, pause when running
    pub fn toggle_start(&mut self) -> Result<(), TrackerError> {
        if self.state.is_running() {
            self.pause();
            Ok(())
        } else {
            self.start()
        }
    }

    pub fn reset(&mut self) {
        self.state.clear_progress();
        self.emit(TrackerEvent::Reset);
        self.persist();
    }

    /// Record a split. Only meaningful for a running stopwatch.
    pub fn lap(&mut self) -> Option<Lap> {
        if !self.can_lap() {
            return None;
        }
        let now = self.clock.now_ms();
        self.tick(now);

        let elapsed = self.state.elapsed_ms;
        let (index, previous) = match self.state.laps.last() {
            Some(last) => (last.index.saturating_add(1), last.cumulative_ms),
            None => (1, 0),
        };
        let lap = Lap {
            index,
            split_ms: elapsed.saturating_sub(previous),
            cumulative_ms: elapsed,
            recorded_at: self.clock.wall_time().format("%H:%M:%S").to_string(),
        };
        self.state.laps.push(lap.clone());

        self.emit(TrackerEvent::LapRecorded(lap.clone()));
        self.persist();
        Some(lap)
    }

    pub fn switch_mode(&mut self, mode: Mode) -> Result<(), TrackerError> {
        if self.state.is_running() {
            return Err(TrackerError::InvalidState("switching modes"));
        }

        let previous = self.state.mode;
        self.state.clear_progress();
        self.state.mode = mode;
        if mode == Mode::Countdown {
            self.state.elapsed_ms = self.state.countdown_target_ms;
        }

        if previous != mode {
            info!("mode changed to {mode}");
            self.emit(TrackerEvent::ModeChanged(mode));
        }
        self.persist();
        Ok(())
    }

    pub fn toggle_mode(&mut self) -> Result<(), TrackerError> {
        self.switch_mode(self.state.mode.toggled())
    }

    pub fn configure_countdown(
        &mut self,
        hours: u32,
        minutes: u32,
        seconds: u32,
    ) -> Result<u64, TrackerError> {
        if self.state.is_running() {
            return Err(TrackerError::InvalidState("changing the countdown"));
        }
        if minutes > 59 {
            return Err(ValidationIssue::MinutesOutOfRange(minutes).into());
        }
        if seconds > 59 {
            return Err(ValidationIssue::SecondsOutOfRange(seconds).into());
        }

        let total_ms =
            (hours as u64 * 3600 + minutes as u64 * 60 + seconds as u64) * 1000;
        if total_ms == 0 {
            return Err(ValidationIssue::ZeroDuration.into());
        }

        self.state.countdown_target_ms = total_ms;
        if self.state.mode == Mode::Countdown {
            self.state.clear_progress();
            self.state.elapsed_ms = total_ms;
        }

        self.emit(TrackerEvent::CountdownConfigured(total_ms));
        self.persist();
        Ok(total_ms)
    }

    pub fn toggle_sound(&mut self) -> bool {
        self.state.sound_enabled = !self.state.sound_enabled;
        self.persist();
        self.state.sound_enabled
    }

    pub fn sound_enabled(&self) -> bool {
        self.state.sound_enabled
    }

    /// Recompute elapsed time from the clock reading `now`.
    /// No-op unless running.
    pub fn tick(&mut self, now: u64) {
        if !self.state.is_running() {
            return;
        }
        let Some(start) = self.state.start_reference else {
            return;
        };
        let run_time = self
            .state
            .paused_accumulator
            .saturating_add(now.saturating_sub(start));

        match self.state.mode {
            Mode::Stopwatch => self.state.elapsed_ms = run_time,
            Mode::Countdown => {
                self.state.elapsed_ms = self.state.countdown_target_ms.saturating_sub(run_time);
                if self.state.elapsed_ms == 0 {
                    self.complete_countdown();
                }
            }
        }
    }

    /// `tick` against the injected clock
    pub fn poll(&mut self) {
        let now = self.clock.now_ms();
        self.tick(now);
    }

    fn complete_countdown(&mut self) {
        self.state.phase = Phase::Idle;
        self.state.elapsed_ms = 0;
        self.state.start_reference = None;
        self.state.paused_accumulator = 0;
        info!(
            "countdown of {}ms completed",
            self.state.countdown_target_ms
        );

        self.emit(TrackerEvent::CountdownCompleted);
        self.persist();
    }

    pub fn current_snapshot(&self) -> TrackerSnapshot {
        let marks = lap_marks(&self.state.laps);
        TrackerSnapshot {
            mode: self.state.mode,
            phase: self.state.phase,
            running: self.state.is_running(),
            paused: self.state.is_paused(),
            can_lap: self.can_lap(),
            elapsed_ms: self.state.elapsed_ms,
            time: TimeComponents::from_millis(self.state.elapsed_ms),
            countdown_target_ms: self.state.countdown_target_ms,
            sound_enabled: self.state.sound_enabled,
            laps: self
                .state
                .laps
                .iter()
                .cloned()
                .zip(marks)
                .map(|(lap, mark)| LapView { lap, mark })
                .collect(),
        }
    }

    /// Durable subset of the current state
    pub fn persisted_snapshot(&self) -> PersistedSnapshot {
        self.state.to_persisted()
    }

    /// Write the current state to the store
    pub fn persist(&self) {
        self.store.save(&self.state.to_persisted());
    }

    fn emit(&mut self, event: TrackerEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
        self.pending.push(event);
    }
}
