// Library surface for the binary, headless runs and integration tests.
pub mod alarm;
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod keymap;
pub mod logging;
pub mod persistence;
pub mod runtime;
pub mod toast;
pub mod tracker;
pub mod ui;

pub use error::{TrackerError, ValidationIssue};
pub use tracker::{Lap, Mode, Phase, TimeTracker, TrackerEvent, TrackerSnapshot};
