//! Wall clock source

use jiff::Zoned;

/// One reading of the wall clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    pub unix_ms: i64,
    /// Local offset from UTC, for the clock face
    pub utc_offset_s: i32,
}

impl WallTime {
    /// Milliseconds for expiry bookkeeping; clamps pre-epoch clocks to 0
    pub fn millis(&self) -> u64 {
        u64::try_from(self.unix_ms).unwrap_or(0)
    }
}

pub trait Clock: Send {
    fn now(&self) -> WallTime;
}

/// System time in the host's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> WallTime {
        let now = Zoned::now();
        WallTime {
            unix_ms: now.timestamp().as_millisecond(),
            utc_offset_s: now.offset().seconds(),
        }
    }
}
