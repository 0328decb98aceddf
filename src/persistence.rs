use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::PersistError;
use crate::tracker::{Lap, Mode};

/// Fixed key the snapshot is stored under
pub const STORAGE_KEY: &str = "timerState";

/// Only the most recent laps survive a save
pub const MAX_PERSISTED_LAPS: usize = 50;

/// Every countdown `configure_countdown` accepts fits below this. Larger
/// stored durations can only come from a damaged record and read back as 0.
pub const MAX_STORED_MILLIS: u64 = (u32::MAX as u64 + 1) * 3_600_000;

/// Stored lap numbers above this are treated as damaged
pub const MAX_LAP_NUMBER: u32 = 1_000_000;

/// Durable subset of the tracker state.
///
/// The field names are a stable on-disk format. Every field falls back to
/// its default on its own when missing or unreadable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedSnapshot {
    #[serde(deserialize_with = "lenient_mode")]
    pub mode: Mode,
    #[serde(deserialize_with = "lenient_millis")]
    pub time_elapsed: u64,
    #[serde(deserialize_with = "lenient_laps")]
    pub laps: Vec<PersistedLap>,
    #[serde(deserialize_with = "lenient_sound")]
    pub sound_enabled: bool,
    #[serde(deserialize_with = "lenient_millis")]
    pub countdown_target: u64,
}

impl Default for PersistedSnapshot {
    fn default() -> Self {
        Self {
            mode: Mode::Stopwatch,
            time_elapsed: 0,
            laps: Vec::new(),
            sound_enabled: true,
            countdown_target: 0,
        }
    }
}

impl PersistedSnapshot {
    /// Keep only the most recent `MAX_PERSISTED_LAPS` laps
    pub fn truncate_laps(&mut self) {
        if self.laps.len() > MAX_PERSISTED_LAPS {
            let excess = self.laps.len() - MAX_PERSISTED_LAPS;
            self.laps.drain(..excess);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedLap {
    #[serde(deserialize_with = "lenient_index")]
    pub number: u32,
    #[serde(deserialize_with = "lenient_millis")]
    pub duration: u64,
    #[serde(deserialize_with = "lenient_millis")]
    pub accumulated: u64,
    #[serde(default)]
    pub timestamp: String,
}

impl From<&Lap> for PersistedLap {
    fn from(lap: &Lap) -> Self {
        Self {
            number: lap.index,
            duration: lap.split_ms,
            accumulated: lap.cumulative_ms,
            timestamp: lap.recorded_at.clone(),
        }
    }
}

impl From<PersistedLap> for Lap {
    fn from(lap: PersistedLap) -> Self {
        Self {
            index: lap.number,
            split_ms: lap.duration,
            cumulative_ms: lap.accumulated,
            recorded_at: lap.timestamp,
        }
    }
}

// Older records carry fractional (and occasionally negative) milliseconds.
fn lenient_millis<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(value
        .and_then(|v| v.as_f64())
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .map(|ms| ms.floor() as u64)
        .filter(|ms| *ms <= MAX_STORED_MILLIS)
        .unwrap_or(0))
}

fn lenient_index<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let number = lenient_millis(d)?;
    Ok(u32::try_from(number)
        .ok()
        .filter(|n| *n <= MAX_LAP_NUMBER)
        .unwrap_or(0))
}

fn lenient_mode<'de, D: Deserializer<'de>>(d: D) -> Result<Mode, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value.as_ref().and_then(|v| v.as_str()) {
        Some("countdown") => Mode::Countdown,
        _ => Mode::Stopwatch,
    })
}

// Sound stays on unless the record explicitly says `false`.
fn lenient_sound<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(!matches!(value, Some(serde_json::Value::Bool(false))))
}

fn lenient_laps<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<PersistedLap>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    let Some(serde_json::Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<PersistedLap>(item).ok())
        .collect())
}

/// Decode a stored record. Anything unreadable is treated as absent.
pub fn decode_snapshot(raw: &str) -> Option<PersistedSnapshot> {
    match serde_json::from_str::<Option<PersistedSnapshot>>(raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("ignoring corrupt {STORAGE_KEY} record: {e}");
            None
        }
    }
}

pub fn encode_snapshot(snapshot: &PersistedSnapshot) -> Result<String, PersistError> {
    let mut snapshot = snapshot.clone();
    snapshot.truncate_laps();
    Ok(serde_json::to_string(&snapshot)?)
}

/// Persistence adapter used by the tracker.
///
/// Both operations are best-effort: `save` logs failures instead of
/// returning them and `load` yields `None` for missing or corrupt data.
pub trait SnapshotStore {
    fn load(&self) -> Option<PersistedSnapshot>;
    fn save(&self, snapshot: &PersistedSnapshot);
}

/// Stores the snapshot as a JSON file
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: crate::app_dirs::AppDirs::state_path()
                .unwrap_or_else(|| PathBuf::from(format!("{STORAGE_KEY}.json"))),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_save(&self, snapshot: &PersistedSnapshot) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = encode_snapshot(snapshot)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl Default for FileSnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Option<PersistedSnapshot> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode_snapshot(&raw),
            Err(e) => {
                debug!("no snapshot at {}: {e}", self.path.display());
                None
            }
        }
    }

    fn save(&self, snapshot: &PersistedSnapshot) {
        if let Err(e) = self.try_save(snapshot) {
            warn!("failed to save snapshot to {}: {e}", self.path.display());
        }
    }
}

/// In-memory key-value store holding the encoded record.
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a raw record, e.g. data written by an older version
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(raw.into()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Option<PersistedSnapshot> {
        self.slot.borrow().as_deref().and_then(decode_snapshot)
    }

    fn save(&self, snapshot: &PersistedSnapshot) {
        match encode_snapshot(snapshot) {
            Ok(raw) => *self.slot.borrow_mut() = Some(raw),
            Err(e) => warn!("failed to encode snapshot: {e}"),
        }
    }
}

/// Resolve the store location from an optional override
pub fn store_for(path: Option<&Path>) -> FileSnapshotStore {
    match path {
        Some(p) => FileSnapshotStore::with_path(p),
        None => FileSnapshotStore::new(),
    }
}
