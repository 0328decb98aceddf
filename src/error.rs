use thiserror::Error;

/// Why a countdown configuration was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("minutes must be between 0 and 59, got {0}")]
    MinutesOutOfRange(u32),

    #[error("seconds must be between 0 and 59, got {0}")]
    SecondsOutOfRange(u32),

    #[error("duration must be greater than zero")]
    ZeroDuration,
}

/// Rejected tracker commands. None of these mutate state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerError {
    #[error("configure the countdown before starting it")]
    Configuration,

    #[error("invalid countdown: {0}")]
    Validation(#[from] ValidationIssue),

    #[error("stop the timer before {0}")]
    InvalidState(&'static str),
}

/// Failures inside a snapshot store. Swallowed at the store boundary.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures while exporting laps to CSV
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("there are no laps to export")]
    NoLaps,

    #[error("export i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
}
