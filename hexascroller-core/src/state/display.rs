//! Shared display state
//!
//! Owned by the service behind a single mutex. The control surface writes
//! power, invert and new messages; the panel loop expires messages, advances
//! the scroll position and records the last bitmap it pushed.
//!
//! Times are unix milliseconds supplied by the caller, so every operation
//! here is deterministic.

use heapless::String;
use hexascroller_protocol::{PANEL_BYTES, PANEL_WIDTH};

use super::events::ControlEvent;
use crate::config::DisplayConfig;

/// Longest message kept, in bytes
pub const MAX_MESSAGE_LEN: usize = 255;

/// Message text storage
pub type MessageText = String<MAX_MESSAGE_LEN>;

/// One compiled panel bitmap
pub type Bitmap = [u8; PANEL_BYTES];

/// Seconds per pixel step for a message `width` pixels wide
///
/// Zero when the message fits the panel. Otherwise the overhang is spread
/// over the scroll budget so one pass takes `duration × scroll_fraction`.
pub fn scroll_interval(width: u32, config: &DisplayConfig) -> f32 {
    let panel = PANEL_WIDTH as u32;
    if width <= panel {
        return 0.0;
    }
    config.scroll_budget_s() / (width - panel) as f32
}

/// A message with its expiry and scroll parameters
///
/// Text and expiry live together so one can never be set without the other.
#[derive(Debug, Clone, PartialEq)]
struct ActiveMessage {
    text: MessageText,
    expiry_ms: u64,
    width: u32,
    scroll_interval: f32,
}

/// What changed after applying a control event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// New power state, to be echoed on the bus
    Power(bool),
    /// New invert state, to be echoed on the bus
    Invert(bool),
    /// A message was accepted; `truncated` if it exceeded `MAX_MESSAGE_LEN`
    Message { truncated: bool },
}

/// Message part of a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub text: MessageText,
    /// Rendered width in pixels
    pub width: u32,
    /// Whole-pixel scroll offset, always below `width` when scrolling
    pub offset: u32,
}

/// Everything the renderer needs, copied out under the lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySnapshot {
    pub inverted: bool,
    pub message: Option<MessageView>,
}

#[derive(Debug, Clone)]
pub struct DisplayState {
    powered: bool,
    inverted: bool,
    message: Option<ActiveMessage>,
    scroll_offset: f32,
    last_bitmap: Option<Bitmap>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayState {
    /// Initial state: powered, not inverted, showing the clock
    pub fn new() -> Self {
        Self {
            powered: true,
            inverted: false,
            message: None,
            scroll_offset: 0.0,
            last_bitmap: None,
        }
    }

    pub fn powered(&self) -> bool {
        self.powered
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn set_powered(&mut self, powered: bool) {
        self.powered = powered;
    }

    pub fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    /// Current message text, regardless of expiry
    pub fn message(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.text.as_str())
    }

    pub fn message_expiry(&self) -> Option<u64> {
        self.message.as_ref().map(|m| m.expiry_ms)
    }

    /// Seconds per pixel for the current message, 0 if none or if it fits
    pub fn scroll_interval(&self) -> f32 {
        self.message.as_ref().map_or(0.0, |m| m.scroll_interval)
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    /// Message that should be visible at `now_ms`
    pub fn active_message(&self, now_ms: u64) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|m| now_ms < m.expiry_ms)
            .map(|m| m.text.as_str())
    }

    /// Replace the current message
    ///
    /// `width` is the rendered pixel width of `text`. Text longer than
    /// `MAX_MESSAGE_LEN` bytes is cut at a char boundary; the return value
    /// reports whether that happened.
    pub fn set_message(
        &mut self,
        text: &str,
        width: u32,
        now_ms: u64,
        config: &DisplayConfig,
    ) -> bool {
        let mut stored = MessageText::new();
        let mut truncated = false;
        for c in text.chars() {
            if stored.push(c).is_err() {
                truncated = true;
                break;
            }
        }

        self.message = Some(ActiveMessage {
            text: stored,
            expiry_ms: now_ms.saturating_add(config.duration_ms()),
            width,
            scroll_interval: scroll_interval(width, config),
        });
        self.scroll_offset = 0.0;
        truncated
    }

    /// Drop the message if it has expired; returns true if one was dropped
    pub fn clear_expired(&mut self, now_ms: u64) -> bool {
        match &self.message {
            Some(m) if now_ms >= m.expiry_ms => {
                self.message = None;
                self.scroll_offset = 0.0;
                true
            }
            _ => false,
        }
    }

    /// Advance the scroll position by one tick of `tick_s` seconds
    ///
    /// The offset wraps at the message width. Messages that fit the panel
    /// never move.
    pub fn advance_scroll(&mut self, tick_s: f32) {
        let Some(m) = &self.message else {
            return;
        };
        if m.scroll_interval <= 0.0 || m.width == 0 {
            return;
        }
        let wrap = m.width as f32;
        let next = (self.scroll_offset + tick_s / m.scroll_interval) % wrap;
        self.scroll_offset = if next.is_finite() && next >= 0.0 {
            next
        } else {
            0.0
        };
    }

    /// Copy out what the renderer needs
    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            inverted: self.inverted,
            message: self.message.as_ref().map(|m| MessageView {
                text: m.text.clone(),
                width: m.width,
                // Truncation is floor for the non-negative offset
                offset: self.scroll_offset as u32,
            }),
        }
    }

    /// Check whether `bitmap` differs from what the panels already show
    pub fn needs_write(&self, bitmap: &Bitmap) -> bool {
        self.last_bitmap.as_ref() != Some(bitmap)
    }

    /// Record a bitmap every panel accepted
    pub fn store_bitmap(&mut self, bitmap: Bitmap) {
        self.last_bitmap = Some(bitmap);
    }

    /// Forget the last bitmap so the next one is always written
    pub fn clear_last_bitmap(&mut self) {
        self.last_bitmap = None;
    }

    pub fn last_bitmap(&self) -> Option<&Bitmap> {
        self.last_bitmap.as_ref()
    }

    /// Apply a control event
    ///
    /// `measure` returns the rendered pixel width of a message.
    pub fn apply(
        &mut self,
        event: &ControlEvent<'_>,
        now_ms: u64,
        config: &DisplayConfig,
        measure: impl FnOnce(&str) -> u32,
    ) -> StateChange {
        match *event {
            ControlEvent::PowerSet(on) => {
                self.set_powered(on);
                StateChange::Power(on)
            }
            ControlEvent::InvertSet(on) => {
                self.set_inverted(on);
                StateChange::Invert(on)
            }
            ControlEvent::Message(text) => {
                let truncated = self.set_message(text, 0, now_ms, config);
                // Measure what was kept, not what was sent
                let width = self.message().map(measure).unwrap_or(0);
                if let Some(m) = self.message.as_mut() {
                    m.width = width;
                    m.scroll_interval = scroll_interval(width, config);
                }
                StateChange::Message { truncated }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const T: u64 = 1_700_000_000_000;

    fn six_px(text: &str) -> u32 {
        text.chars().count() as u32 * 6
    }

    #[test]
    fn test_initial_state() {
        let state = DisplayState::new();
        assert!(state.powered());
        assert!(!state.inverted());
        assert_eq!(state.message(), None);
        assert_eq!(state.message_expiry(), None);
        assert_eq!(state.last_bitmap(), None);
    }

    #[test]
    fn test_message_lifecycle() {
        let config = DisplayConfig::default();
        let mut state = DisplayState::new();
        state.set_message("HELLO", 30, T, &config);

        assert_eq!(state.active_message(T), Some("HELLO"));
        assert_eq!(state.active_message(T + 29_999), Some("HELLO"));
        assert_eq!(state.active_message(T + 30_000), None);

        assert!(!state.clear_expired(T + 29_999));
        assert!(state.clear_expired(T + 30_000));
        assert_eq!(state.message(), None);
        assert_eq!(state.message_expiry(), None);
    }

    #[test]
    fn test_message_and_expiry_set_together() {
        let config = DisplayConfig::default();
        let mut state = DisplayState::new();
        assert_eq!(state.message().is_some(), state.message_expiry().is_some());
        state.set_message("x", 6, T, &config);
        assert_eq!(state.message_expiry(), Some(T + 30_000));
        state.clear_expired(T + 40_000);
        assert_eq!(state.message().is_some(), state.message_expiry().is_some());
    }

    #[test]
    fn test_scroll_interval_fits() {
        let config = DisplayConfig::default();
        assert_eq!(scroll_interval(120, &config), 0.0);
        assert_eq!(scroll_interval(10, &config), 0.0);
    }

    #[test]
    fn test_scroll_interval_overhang() {
        let config = DisplayConfig::default();
        // 27 s budget over 100 px of overhang
        assert!((scroll_interval(220, &config) - 0.27).abs() < 1e-5);
        assert!((scroll_interval(121, &config) - 27.0).abs() < 1e-4);
    }

    #[test]
    fn test_new_message_resets_scroll() {
        let config = DisplayConfig::default();
        let mut state = DisplayState::new();
        state.set_message("first", 300, T, &config);
        for _ in 0..50 {
            state.advance_scroll(config.active_tick_s());
        }
        assert!(state.scroll_offset() > 0.0);

        state.set_message("second", 300, T + 1000, &config);
        assert_eq!(state.scroll_offset(), 0.0);
    }

    #[test]
    fn test_short_message_does_not_scroll() {
        let config = DisplayConfig::default();
        let mut state = DisplayState::new();
        state.set_message("hi", 12, T, &config);
        state.advance_scroll(config.active_tick_s());
        assert_eq!(state.scroll_offset(), 0.0);
        assert_eq!(state.snapshot().message.unwrap().offset, 0);
    }

    #[test]
    fn test_scroll_step_follows_interval() {
        let config = DisplayConfig::default();
        let mut state = DisplayState::new();
        // Interval 0.27 s/px, tick 0.06 s -> 0.2222 px per tick
        state.set_message("long", 220, T, &config);
        for _ in 0..9 {
            state.advance_scroll(0.06);
        }
        assert!((state.scroll_offset() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_truncates_at_char_boundary() {
        let config = DisplayConfig::default();
        let mut state = DisplayState::new();
        let mut long = heapless::String::<600>::new();
        for _ in 0..200 {
            long.push('é').unwrap();
        }
        assert!(state.set_message(&long, 0, T, &config));
        let kept = state.message().unwrap();
        assert_eq!(kept.len(), 254);
        assert_eq!(kept.chars().count(), 127);

        assert!(!state.set_message("short", 0, T, &config));
    }

    #[test]
    fn test_apply_events() {
        let config = DisplayConfig::default();
        let mut state = DisplayState::new();

        let change = state.apply(&ControlEvent::PowerSet(false), T, &config, six_px);
        assert_eq!(change, StateChange::Power(false));
        assert!(!state.powered());

        let change = state.apply(&ControlEvent::InvertSet(true), T, &config, six_px);
        assert_eq!(change, StateChange::Invert(true));
        assert!(state.inverted());

        let change = state.apply(&ControlEvent::Message("HELLO"), T, &config, six_px);
        assert_eq!(change, StateChange::Message { truncated: false });
        let snapshot = state.snapshot();
        assert!(snapshot.inverted);
        let view = snapshot.message.unwrap();
        assert_eq!(view.text.as_str(), "HELLO");
        assert_eq!(view.width, 30);
        assert_eq!(state.scroll_interval(), 0.0);
    }

    #[test]
    fn test_apply_long_message_sets_interval() {
        let config = DisplayConfig::default();
        let mut state = DisplayState::new();
        let text = "0123456789012345678901234567890123456789";
        state.apply(&ControlEvent::Message(text), T, &config, six_px);
        // 240 px wide, 120 px overhang
        assert!((state.scroll_interval() - 27.0 / 120.0).abs() < 1e-5);
    }

    #[test]
    fn test_bitmap_suppression() {
        let mut state = DisplayState::new();
        let bitmap = [0x80u8; PANEL_BYTES];
        assert!(state.needs_write(&bitmap));
        state.store_bitmap(bitmap);
        assert!(!state.needs_write(&bitmap));

        let mut other = bitmap;
        other[5] = 0;
        assert!(state.needs_write(&other));

        state.clear_last_bitmap();
        assert!(state.needs_write(&bitmap));
    }

    proptest! {
        #[test]
        fn test_scroll_offset_stays_in_range(
            width in 121u32..4000,
            ticks in proptest::collection::vec(0.0f32..2.0, 0..400),
        ) {
            let config = DisplayConfig::default();
            let mut state = DisplayState::new();
            state.set_message("scrolling", width, T, &config);
            for tick in ticks {
                state.advance_scroll(tick);
                let offset = state.scroll_offset();
                prop_assert!(offset >= 0.0);
                prop_assert!(offset < width as f32);
                prop_assert!(state.snapshot().message.unwrap().offset < width);
            }
        }

        #[test]
        fn test_interval_formula(delta in 1u32..2000, duration_s in 1u32..600) {
            let config = DisplayConfig { duration_s, ..DisplayConfig::default() };
            let interval = scroll_interval(PANEL_WIDTH as u32 + delta, &config);
            let expected = (0.9 * duration_s as f32) / delta as f32;
            prop_assert!((interval - expected).abs() <= expected * 1e-4);
        }
    }
}
