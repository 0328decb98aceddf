use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Redraw interval while nothing is counting; only toasts need to expire
pub const IDLE_TICK: Duration = Duration::from_millis(250);

/// What the main loop reacts to
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Terminal input, delivered over a channel
pub struct EventSource {
    rx: Receiver<AppEvent>,
}

impl EventSource {
    /// Forward crossterm key and resize events from a reader thread
    pub fn crossterm() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Windows reports releases too; only presses are commands
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    tx.send(AppEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    log::error!("terminal event stream closed: {e}");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }

    /// Events fed by hand, for headless runs
    pub fn from_channel(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

/// How often the display is refreshed, depending on whether a timer runs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence {
    running: Duration,
    idle: Duration,
}

impl Cadence {
    /// `idle` is never faster than `running`
    pub fn new(running: Duration, idle: Duration) -> Self {
        let running = running.max(Duration::from_millis(1));
        Self {
            running,
            idle: idle.max(running),
        }
    }

    pub fn interval(&self, timer_running: bool) -> Duration {
        if timer_running {
            self.running
        } else {
            self.idle
        }
    }
}

/// Interleaves input with ticks on a fixed schedule.
///
/// Ticks are due at deadlines rather than after a quiet period, so a burst
/// of key presses cannot hold the displayed time back.
pub struct Runner {
    events: EventSource,
    cadence: Cadence,
    next_tick: Instant,
}

impl Runner {
    pub fn new(events: EventSource, cadence: Cadence) -> Self {
        Self {
            events,
            next_tick: Instant::now() + cadence.interval(true),
            cadence,
        }
    }

    /// Next input event, or `Tick` once the current deadline has passed
    pub fn step(&mut self, timer_running: bool) -> AppEvent {
        let interval = self.cadence.interval(timer_running);
        let now = Instant::now();
        // a timer that just started should not wait out the idle interval
        self.next_tick = self.next_tick.min(now + interval);

        if now >= self.next_tick {
            return self.tick(now, interval);
        }

        match self.events.rx.recv_timeout(self.next_tick - now) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.tick(Instant::now(), interval),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(self.next_tick.saturating_duration_since(Instant::now()));
                self.tick(Instant::now(), interval)
            }
        }
    }

    fn tick(&mut self, now: Instant, interval: Duration) -> AppEvent {
        self.next_tick = now + interval;
        AppEvent::Tick
    }
}
