//! Panel loop mode machine
//!
//! The loop is either rendering (Active) or parked (Idle). Which one is
//! decided solely by the `powered` flag of the display state.

use crate::config::DisplayConfig;

/// Panel loop modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMode {
    /// Panels powered; render and push a bitmap every tick
    Active,
    /// Panels unpowered; no rendering, no panel writes
    Idle,
}

/// Events that move the panel loop between modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    PowerOn,
    PowerOff,
}

impl ModeEvent {
    pub fn from_powered(powered: bool) -> Self {
        if powered {
            ModeEvent::PowerOn
        } else {
            ModeEvent::PowerOff
        }
    }
}

impl PanelMode {
    /// Check if this mode renders and writes bitmaps
    pub fn renders(&self) -> bool {
        matches!(self, PanelMode::Active)
    }

    /// Sleep between ticks in this mode, in milliseconds
    pub fn tick_ms(&self, config: &DisplayConfig) -> u32 {
        match self {
            PanelMode::Active => config.active_tick_ms,
            PanelMode::Idle => config.idle_tick_ms,
        }
    }

    /// Process an event and return the next mode
    pub fn transition(self, event: ModeEvent) -> Self {
        use ModeEvent::*;
        use PanelMode::*;

        match (self, event) {
            (Idle, PowerOn) => Active,
            (Active, PowerOff) => Idle,
            // Repeated events keep the current mode
            (mode, _) => mode,
        }
    }

    /// Check if moving from `previous` to `self` wakes the panels
    ///
    /// A wake invalidates whatever the panels showed before power loss.
    pub fn woke_from(self, previous: PanelMode) -> bool {
        previous == PanelMode::Idle && self == PanelMode::Active
    }
}
