//! Clock face math
//!
//! Swatch Internet Time divides the day into 1000 beats, anchored to
//! Biel Mean Time (UTC+1, no daylight saving). The wall clock is derived
//! from the same unix timestamp plus the host's current UTC offset.

use core::fmt::Write;
use heapless::String;

const MS_PER_DAY: i64 = 86_400_000;
const SECONDS_PER_DAY: i64 = 86_400;
/// Biel Mean Time is UTC+1
const BMT_OFFSET_MS: i64 = 3_600_000;
/// Milliseconds per beat is 86.4, so beats = ms_of_day / 86_400.0
const MS_PER_MILLIBEAT: f64 = 86_400.0;

/// Internet time in beats for a unix timestamp in milliseconds
///
/// Always in `[0, 1000)`.
pub fn beats(unix_ms: i64) -> f64 {
    let ms_of_day = (unix_ms + BMT_OFFSET_MS).rem_euclid(MS_PER_DAY);
    ms_of_day as f64 / MS_PER_MILLIBEAT
}

/// Wall-clock time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalTime {
    /// Time of day for a unix timestamp shifted by `utc_offset_s`
    pub fn from_unix(unix_ms: i64, utc_offset_s: i32) -> Self {
        let seconds = unix_ms.div_euclid(1000) + i64::from(utc_offset_s);
        let of_day = seconds.rem_euclid(SECONDS_PER_DAY);
        Self {
            hour: (of_day / 3600) as u8,
            minute: (of_day / 60 % 60) as u8,
            second: (of_day % 60) as u8,
        }
    }
}

/// The two strings shown in clock mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockFace {
    /// `HH:MM:SS`
    pub time: String<8>,
    /// Beats formatted to two decimals, zero padded to six characters
    pub beats: String<8>,
}

impl ClockFace {
    pub fn at(unix_ms: i64, utc_offset_s: i32) -> Self {
        let local = LocalTime::from_unix(unix_ms, utc_offset_s);
        let mut time = String::new();
        let mut beat_text = String::new();
        // Both strings fit their capacity: 8 chars and at most "1000.00"
        let _ = write!(
            time,
            "{:02}:{:02}:{:02}",
            local.hour, local.minute, local.second
        );
        let _ = write!(beat_text, "{:06.2}", beats(unix_ms));
        Self {
            time,
            beats: beat_text,
        }
    }
}
