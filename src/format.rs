//! Time formatting and lap comparison helpers.
//!
//! All decomposition uses floor arithmetic so the display never runs
//! ahead of the tracked time.

use itertools::{Itertools, MinMaxResult};
use std::fmt;

use crate::tracker::Lap;

/// A duration split into display components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeComponents {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub millis: u64,
}

impl TimeComponents {
    pub fn from_millis(ms: u64) -> Self {
        let total_secs = ms / 1000;
        Self {
            hours: total_secs / 3600,
            minutes: (total_secs % 3600) / 60,
            seconds: total_secs % 60,
            millis: ms % 1000,
        }
    }

    pub fn to_millis(&self) -> u64 {
        ((self.hours * 3600 + self.minutes * 60 + self.seconds) * 1000) + self.millis
    }

    /// "HH:MM:SS" without the millisecond part
    pub fn hms(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

impl fmt::Display for TimeComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:03}",
            self.hours, self.minutes, self.seconds, self.millis
        )
    }
}

/// Format milliseconds as "HH:MM:SS"
pub fn format_time(ms: u64) -> String {
    TimeComponents::from_millis(ms).hms()
}

/// Format milliseconds as "HH:MM:SS.mmm"
pub fn format_time_precise(ms: u64) -> String {
    TimeComponents::from_millis(ms).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapMark {
    Best,
    Worst,
}

/// Flags the fastest and slowest split.
///
/// Returns one entry per lap. Fewer than two laps, or all splits equal,
/// yields no flags.
pub fn lap_marks(laps: &[Lap]) -> Vec<Option<LapMark>> {
    let mut marks = vec![None; laps.len()];
    if laps.len() < 2 {
        return marks;
    }

    if let MinMaxResult::MinMax(best, worst) = laps.iter().position_minmax_by_key(|lap| lap.split_ms)
    {
        if laps[best].split_ms != laps[worst].split_ms {
            marks[best] = Some(LapMark::Best);
            marks[worst] = Some(LapMark::Worst);
        }
    }

    marks
}

/// Parse "H:M:S", "M:S" or "S" into (hours, minutes, seconds).
///
/// Only the shape is checked here; range validation belongs to
/// `TimeTracker::configure_countdown`.
pub fn parse_hms(input: &str) -> Option<(u32, u32, u32)> {
    let parts = input
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<u32>().ok())
        .collect::<Option<Vec<u32>>>()?;

    match parts.as_slice() {
        [s] => Some((0, 0, *s)),
        [m, s] => Some((0, *m, *s)),
        [h, m, s] => Some((*h, *m, *s)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lap(index: u32, split_ms: u64, cumulative_ms: u64) -> Lap {
        Lap {
            index,
            split_ms,
            cumulative_ms,
            recorded_at: "12:00:00".to_string(),
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00:00");
        assert_eq!(format_time(61_000), "00:01:01");
        assert_eq!(format_time(3_661_000), "01:01:01");
    }

    #[test]
    fn test_format_time_precise() {
        assert_eq!(format_time_precise(0), "00:00:00.000");
        assert_eq!(format_time_precise(12_345), "00:00:12.345");
        assert_eq!(format_time_precise(7), "00:00:00.007");
    }

    #[test]
    fn test_floor_never_rounds_up() {
        // 59.999s must not display as a full minute
        assert_eq!(format_time(59_999), "00:00:59");
        assert_eq!(format_time_precise(3_599_999), "00:59:59.999");
    }

    #[test]
    fn test_hours_grow_past_two_digits() {
        assert_eq!(format_time(100 * 3_600_000), "100:00:00");
    }

    #[test]
    fn test_no_marks_for_single_lap() {
        assert_eq!(lap_marks(&[]), Vec::<Option<LapMark>>::new());
        assert_eq!(lap_marks(&[lap(1, 500, 500)]), vec![None]);
    }

    #[test]
    fn test_best_and_worst_marks() {
        let laps = vec![lap(1, 3000, 3000), lap(2, 1000, 4000), lap(3, 5000, 9000)];
        assert_eq!(
            lap_marks(&laps),
            vec![None, Some(LapMark::Best), Some(LapMark::Worst)]
        );
    }

    #[test]
    fn test_equal_splits_are_not_marked() {
        let laps = vec![lap(1, 2000, 2000), lap(2, 2000, 4000)];
        assert_eq!(lap_marks(&laps), vec![None, None]);
    }

    #[test]
    fn test_parse_hms() {
        assert_eq!(parse_hms("1:02:03"), Some((1, 2, 3)));
        assert_eq!(parse_hms("5:00"), Some((0, 5, 0)));
        assert_eq!(parse_hms(" 90 "), Some((0, 0, 90)));
        assert_eq!(parse_hms(""), None);
        assert_eq!(parse_hms("1:2:3:4"), None);
        assert_eq!(parse_hms("a:30"), None);
    }

    proptest! {
        #[test]
        fn formatting_is_idempotent(ms in 0u64..1_000_000_000_000) {
            let components = TimeComponents::from_millis(ms);
            let rebuilt = TimeComponents::from_millis(components.to_millis());
            prop_assert_eq!(components.to_string(), rebuilt.to_string());
            prop_assert_eq!(components.to_millis(), ms);
        }

        #[test]
        fn components_stay_in_range(ms in any::<u32>()) {
            let c = TimeComponents::from_millis(ms as u64);
            prop_assert!(c.minutes < 60);
            prop_assert!(c.seconds < 60);
            prop_assert!(c.millis < 1000);
        }
    }
}
