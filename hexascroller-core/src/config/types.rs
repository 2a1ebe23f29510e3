//! Configuration type definitions
//!
//! These types hold the timing knobs of the display engine. The service
//! deserializes them from the `[display]` table of its TOML file.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of physical panels in a chain
pub const PANEL_COUNT: usize = 3;

/// Display timing configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DisplayConfig {
    /// How long a message stays on the panels, in seconds
    pub duration_s: u32,
    /// Share of `duration_s` spent on one full scroll pass (0.0, 1.0]
    pub scroll_fraction: f32,
    /// Panel loop period while powered, in milliseconds
    pub active_tick_ms: u32,
    /// Panel loop period while unpowered, in milliseconds
    pub idle_tick_ms: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            duration_s: 30,
            scroll_fraction: 0.9,
            active_tick_ms: 60,
            idle_tick_ms: 250,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("display duration must be non-zero")]
    ZeroDuration,
    #[error("scroll fraction must be in (0, 1]")]
    ScrollFractionOutOfRange,
    #[error("tick intervals must be non-zero")]
    ZeroTick,
}

impl DisplayConfig {
    /// Message lifetime in milliseconds
    pub fn duration_ms(&self) -> u64 {
        u64::from(self.duration_s) * 1000
    }

    /// Time allowed for one scroll pass, in seconds
    pub fn scroll_budget_s(&self) -> f32 {
        self.duration_s as f32 * self.scroll_fraction
    }

    /// Active tick length in seconds
    pub fn active_tick_s(&self) -> f32 {
        self.active_tick_ms as f32 / 1000.0
    }

    /// Check that the configuration can drive the panel loop
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_s == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if !(self.scroll_fraction > 0.0 && self.scroll_fraction <= 1.0) {
            return Err(ConfigError::ScrollFractionOutOfRange);
        }
        if self.active_tick_ms == 0 || self.idle_tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        Ok(())
    }
}
