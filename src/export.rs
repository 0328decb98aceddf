use chrono::Local;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ExportError;
use crate::format::format_time_precise;
use crate::tracker::Lap;

#[derive(Debug, Serialize)]
struct LapRow<'a> {
    lap: u32,
    split: String,
    cumulative: String,
    split_ms: u64,
    cumulative_ms: u64,
    recorded_at: &'a str,
}

/// Write laps as CSV rows with a header
pub fn write_laps_csv<W: Write>(laps: &[Lap], writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for lap in laps {
        wtr.serialize(LapRow {
            lap: lap.index,
            split: format_time_precise(lap.split_ms),
            cumulative: format_time_precise(lap.cumulative_ms),
            split_ms: lap.split_ms,
            cumulative_ms: lap.cumulative_ms,
            recorded_at: &lap.recorded_at,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export laps into `dir/laps-<timestamp>.csv` and return the path
pub fn export_laps(laps: &[Lap], dir: &Path) -> Result<PathBuf, ExportError> {
    if laps.is_empty() {
        return Err(ExportError::NoLaps);
    }
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("laps-{}.csv", Local::now().format("%Y%m%d-%H%M%S")));
    write_laps_csv(laps, File::create(&path)?)?;
    log::info!("exported {} laps to {}", laps.len(), path.display());
    Ok(path)
}
