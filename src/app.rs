use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::alarm::Alarm;
use crate::config::Config;
use crate::error::TrackerError;
use crate::export::export_laps;
use crate::format::{format_time, parse_hms};
use crate::keymap::{command_for, Command};
use crate::toast::Toasts;
use crate::tracker::{Mode, TimeTracker, TrackerEvent};

/// Modal prompt layered over the timer view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    ConfirmReset,
    EditCountdown(String),
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub confirm_reset: bool,
    pub toast_ttl: Duration,
    pub export_dir: Option<PathBuf>,
}

impl From<&Config> for AppSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            confirm_reset: cfg.confirm_reset,
            toast_ttl: Duration::from_secs(cfg.toast_secs),
            export_dir: crate::app_dirs::AppDirs::export_dir(),
        }
    }
}

/// Terminal host around a `TimeTracker`.
///
/// Owns the presentation-only state (fullscreen, prompts, toasts) and
/// reacts to tracker events; timing state stays inside the tracker.
pub struct App {
    pub tracker: TimeTracker,
    pub toasts: Toasts,
    pub fullscreen: bool,
    pub overlay: Overlay,
    pub should_quit: bool,
    settings: AppSettings,
    alarm: Box<dyn Alarm>,
}

impl App {
    pub fn new(tracker: TimeTracker, alarm: Box<dyn Alarm>, settings: AppSettings) -> Self {
        Self {
            tracker,
            toasts: Toasts::new(settings.toast_ttl),
            fullscreen: false,
            overlay: Overlay::None,
            should_quit: false,
            settings,
            alarm,
        }
    }

    pub fn on_tick(&mut self) {
        self.tracker.poll();
        self.handle_tracker_events();
        self.toasts.prune(Instant::now());
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return;
        }

        match self.overlay.clone() {
            Overlay::None => {
                if let Some(cmd) = command_for(key) {
                    self.apply(cmd);
                }
            }
            Overlay::ConfirmReset => {
                self.overlay = Overlay::None;
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                    self.tracker.reset();
                }
            }
            Overlay::EditCountdown(mut input) => match key.code {
                KeyCode::Esc => self.overlay = Overlay::None,
                KeyCode::Enter => {
                    self.overlay = Overlay::None;
                    self.submit_countdown(&input);
                }
                KeyCode::Backspace => {
                    input.pop();
                    self.overlay = Overlay::EditCountdown(input);
                }
                KeyCode::Char(c) if c.is_ascii_digit() || c == ':' => {
                    input.push(c);
                    self.overlay = Overlay::EditCountdown(input);
                }
                _ => {}
            },
        }
        self.handle_tracker_events();
    }

    pub fn apply(&mut self, cmd: Command) {
        debug!("command {cmd:?}");
        match cmd {
            Command::ToggleStart => {
                let result = self.tracker.toggle_start();
                self.report(result);
            }
            Command::Reset => {
                let state = self.tracker.state();
                let has_data = state.elapsed_ms > 0 || !state.laps.is_empty();
                if self.settings.confirm_reset && has_data && state.is_running() {
                    self.overlay = Overlay::ConfirmReset;
                } else {
                    self.tracker.reset();
                }
            }
            Command::Lap => {
                self.tracker.lap();
            }
            Command::ToggleFullscreen => self.fullscreen = !self.fullscreen,
            Command::ToggleMode => {
                let result = self.tracker.toggle_mode();
                self.report(result);
            }
            Command::ToggleSound => {
                let on = self.tracker.toggle_sound();
                self.toasts.push(if on { "Sound on" } else { "Sound off" });
            }
            Command::EditCountdown => self.open_countdown_editor(),
            Command::ExportLaps => self.export(),
            Command::Quit => self.quit(),
        }
    }

    fn open_countdown_editor(&mut self) {
        if self.tracker.mode() != Mode::Countdown {
            self.toasts.push("Switch to countdown mode (t) to set a duration");
            return;
        }
        if self.tracker.is_running() {
            self.report(Err(TrackerError::InvalidState("changing the countdown")));
            return;
        }
        let target = self.tracker.state().countdown_target_ms;
        let prefill = if target > 0 {
            format_time(target)
        } else {
            String::new()
        };
        self.overlay = Overlay::EditCountdown(prefill);
    }

    fn submit_countdown(&mut self, input: &str) {
        let Some((h, m, s)) = parse_hms(input) else {
            self.toasts.push("Enter a duration as H:M:S");
            return;
        };
        match self.tracker.configure_countdown(h, m, s) {
            Ok(total) => self.toasts.push(format!("Timer set: {}", format_time(total))),
            Err(e) => self.report(Err(e)),
        }
    }

    fn export(&mut self) {
        let Some(dir) = self.settings.export_dir.clone() else {
            self.toasts.push("No export directory available");
            return;
        };
        match export_laps(self.tracker.laps(), &dir) {
            Ok(path) => self.toasts.push(format!("Laps saved to {}", path.display())),
            Err(e) => {
                info!("lap export failed: {e}");
                self.toasts.push(capitalize(&e.to_string()));
            }
        }
    }

    fn quit(&mut self) {
        self.tracker.poll();
        self.tracker.persist();
        self.should_quit = true;
    }

    fn report(&mut self, result: Result<(), TrackerError>) {
        if let Err(e) = result {
            info!("command rejected: {e}");
            self.toasts.push(capitalize(&e.to_string()));
        }
    }

    fn handle_tracker_events(&mut self) {
        for event in self.tracker.drain_events() {
            if event == TrackerEvent::CountdownCompleted {
                if self.tracker.sound_enabled() {
                    self.alarm.ring();
                }
                self.toasts.push("Time's up!");
            }
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
