//! Panel loop
//!
//! One tick: keep the relay in step with `powered`, move between Active and
//! Idle, and while Active render a bitmap and push it to every panel. The
//! display state lock is only held for the bookkeeping around I/O, never
//! across it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hexascroller_core::clock::ClockFace;
use hexascroller_core::config::PANEL_COUNT;
use hexascroller_core::state::events::{switch_payload, TOPIC_POWER};
use hexascroller_core::state::{ModeEvent, PanelMode};
use hexascroller_core::traits::PanelLink;
use hexascroller_display::RenderEngine;

use crate::bus::Publisher;
use crate::context::Context;
use crate::time::{Clock, WallTime};

/// Index of the panel wired to the power relay
const RELAY_PANEL: usize = 0;

pub struct PanelLoop<L, P, C> {
    ctx: Arc<Context>,
    panels: [L; PANEL_COUNT],
    bus: P,
    clock: C,
    renderer: RenderEngine,
    mode: PanelMode,
    /// Last relay state the panel acknowledged
    relay: Option<bool>,
}

impl<L: PanelLink, P: Publisher, C: Clock> PanelLoop<L, P, C> {
    /// `panels` must be ordered by logical id
    pub fn new(ctx: Arc<Context>, panels: [L; PANEL_COUNT], bus: P, clock: C) -> Self {
        Self {
            ctx,
            panels,
            bus,
            clock,
            renderer: RenderEngine::new(),
            mode: PanelMode::Idle,
            relay: None,
        }
    }

    pub fn mode(&self) -> PanelMode {
        self.mode
    }

    /// Run until the context is shut down, then switch the panels off
    pub fn run(&mut self) {
        log::info!("panel loop started");
        while self.ctx.is_running() {
            let delay = self.tick();
            thread::sleep(delay);
        }
        self.shutdown();
    }

    /// Perform one tick and return how long to sleep before the next
    pub fn tick(&mut self) -> Duration {
        let now = self.clock.now();
        let powered = self.ctx.with_state(|s| s.powered());

        self.sync_relay(powered);

        let previous = self.mode;
        self.mode = previous.transition(ModeEvent::from_powered(powered));
        if self.mode.woke_from(previous) {
            log::info!("panels active");
            self.ctx.with_state(|s| s.clear_last_bitmap());
        } else if self.mode != previous {
            log::info!("panels idle");
        }

        if self.mode.renders() {
            self.refresh(now);
        }

        Duration::from_millis(u64::from(self.mode.tick_ms(&self.ctx.display)))
    }

    /// Bring the relay in line with `powered`; retried every tick until it sticks
    fn sync_relay(&mut self, powered: bool) {
        if self.relay == Some(powered) {
            return;
        }
        match self.panels[RELAY_PANEL].set_relay(powered) {
            Ok(()) => {
                self.relay = Some(powered);
                log::info!("relay {}", switch_payload(powered));
                if let Err(e) = self.bus.publish(TOPIC_POWER, switch_payload(powered), true) {
                    log::warn!("publish power state failed: {e}");
                }
            }
            Err(e) => log::warn!("relay switch failed: {e}"),
        }
    }

    fn refresh(&mut self, now: WallTime) {
        let tick_s = self.ctx.display.active_tick_s();
        let (snapshot, expired) = self.ctx.with_state(|s| {
            let expired = s.clear_expired(now.millis());
            let snapshot = s.snapshot();
            s.advance_scroll(tick_s);
            (snapshot, expired)
        });
        if expired {
            log::info!("message expired");
        }

        let face = ClockFace::at(now.unix_ms, now.utc_offset_s);
        let bitmap = self.renderer.render(&snapshot, &face);
        if !self.ctx.with_state(|s| s.needs_write(&bitmap)) {
            return;
        }

        let mut accepted = 0;
        for (id, panel) in self.panels.iter_mut().enumerate() {
            match panel.set_split_image(&bitmap) {
                Ok(()) => accepted += 1,
                Err(e) => log::warn!("panel {id}: {e}"),
            }
        }

        if accepted == PANEL_COUNT {
            self.ctx.with_state(|s| s.store_bitmap(bitmap));
        } else {
            log::debug!("bitmap accepted by {accepted}/{PANEL_COUNT} panels");
        }
    }

    fn shutdown(&mut self) {
        if self.relay != Some(false) {
            match self.panels[RELAY_PANEL].set_relay(false) {
                Ok(()) => self.relay = Some(false),
                Err(e) => log::warn!("relay switch-off failed: {e}"),
            }
        }
        log::info!("panel loop stopped");
    }

    /// Release the panel links
    pub fn into_panels(self) -> [L; PANEL_COUNT] {
        self.panels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pair, FixedClock, MockPanel, RecordingBus};
    use hexascroller_core::config::DisplayConfig;
    use hexascroller_protocol::Opcode;

    const T: i64 = 1_700_000_000_000;
    const ACTIVE: Duration = Duration::from_millis(60);
    const IDLE: Duration = Duration::from_millis(250);

    struct Rig<'a> {
        ctx: Arc<Context>,
        mocks: [MockPanel; PANEL_COUNT],
        panel_loop: PanelLoop<MockPanel, &'a RecordingBus, FixedClock>,
    }

    fn rig(bus: &RecordingBus) -> Rig<'_> {
        let ctx = Arc::new(Context::new(DisplayConfig::default()));
        let mocks: [MockPanel; PANEL_COUNT] = Default::default();
        let panel_loop = PanelLoop::new(Arc::clone(&ctx), mocks.clone(), bus, FixedClock(T));
        Rig {
            ctx,
            mocks,
            panel_loop,
        }
    }

    fn flips(mocks: &[MockPanel; PANEL_COUNT]) -> [usize; PANEL_COUNT] {
        [mocks[0].flips(), mocks[1].flips(), mocks[2].flips()]
    }

    #[test]
    fn test_first_tick_powers_and_writes() {
        let bus = RecordingBus::default();
        let mut rig = rig(&bus);

        assert_eq!(rig.panel_loop.tick(), ACTIVE);
        assert_eq!(rig.panel_loop.mode(), PanelMode::Active);
        // Only panel 0 drives the relay
        assert_eq!(rig.mocks[0].relay(), Some(true));
        assert_eq!(rig.mocks[1].relay(), None);
        assert_eq!(bus.published(), vec![pair(TOPIC_POWER, "ON")]);

        assert_eq!(flips(&rig.mocks), [1, 1, 1]);
        assert!(rig.ctx.with_state(|s| s.last_bitmap().is_some()));
        let opcodes = rig.mocks[1].log.lock().unwrap().opcodes.clone();
        assert_eq!(
            opcodes,
            vec![
                Opcode::BitmapHalf1,
                Opcode::BitmapHalf2,
                Opcode::FlipBuffers,
            ]
        );
    }

    #[test]
    fn test_unchanged_bitmap_not_rewritten() {
        let bus = RecordingBus::default();
        let mut rig = rig(&bus);
        rig.panel_loop.tick();
        rig.panel_loop.tick();
        assert_eq!(flips(&rig.mocks), [1, 1, 1]);
        // Relay is switched once
        assert_eq!(rig.mocks[0].log.lock().unwrap().relay_commands, 1);
    }

    #[test]
    fn test_failing_panel_is_contained() {
        let bus = RecordingBus::default();
        let mut rig = rig(&bus);
        rig.mocks[1].set_failing(true);

        assert_eq!(rig.panel_loop.tick(), ACTIVE);
        assert_eq!(flips(&rig.mocks), [1, 0, 1]);
        // Not every panel has it, so it is not recorded
        assert!(rig.ctx.with_state(|s| s.last_bitmap().is_none()));

        // Retried on the next tick; the healthy panels keep receiving
        rig.panel_loop.tick();
        assert_eq!(flips(&rig.mocks), [2, 0, 2]);

        rig.mocks[1].set_failing(false);
        rig.panel_loop.tick();
        assert_eq!(flips(&rig.mocks), [3, 1, 3]);
        assert!(rig.ctx.with_state(|s| s.last_bitmap().is_some()));
    }

    #[test]
    fn test_relay_failure_retried() {
        let bus = RecordingBus::default();
        let mut rig = rig(&bus);
        rig.mocks[0].set_failing(true);
        rig.panel_loop.tick();
        assert!(bus.published().is_empty());

        rig.mocks[0].set_failing(false);
        rig.panel_loop.tick();
        assert_eq!(rig.mocks[0].relay(), Some(true));
        assert_eq!(bus.published(), vec![pair(TOPIC_POWER, "ON")]);
    }

    #[test]
    fn test_power_off_mid_scroll() {
        let bus = RecordingBus::default();
        let mut rig = rig(&bus);
        let config = DisplayConfig::default();
        let text = "A message far too long to fit on the panel at once";
        let width = hexascroller_display::MESSAGE_FONT.string_width(text);
        rig.ctx
            .with_state(|s| s.set_message(text, width, T as u64, &config));

        rig.panel_loop.tick();
        rig.panel_loop.tick();
        let before = flips(&rig.mocks);
        let offset = rig.ctx.with_state(|s| s.scroll_offset());
        assert!(offset > 0.0);

        rig.ctx.with_state(|s| s.set_powered(false));
        assert_eq!(rig.panel_loop.tick(), IDLE);
        assert_eq!(rig.panel_loop.mode(), PanelMode::Idle);
        assert_eq!(rig.mocks[0].relay(), Some(false));
        assert_eq!(rig.panel_loop.tick(), IDLE);
        // No writes and no scrolling while idle
        assert_eq!(flips(&rig.mocks), before);
        assert_eq!(rig.ctx.with_state(|s| s.scroll_offset()), offset);
    }

    #[test]
    fn test_wake_forces_fresh_bitmap() {
        let bus = RecordingBus::default();
        let mut rig = rig(&bus);
        rig.panel_loop.tick();
        assert_eq!(flips(&rig.mocks), [1, 1, 1]);

        rig.ctx.with_state(|s| s.set_powered(false));
        rig.panel_loop.tick();
        rig.ctx.with_state(|s| s.set_powered(true));
        assert_eq!(rig.panel_loop.tick(), ACTIVE);
        // Same clock face as before, still written after waking
        assert_eq!(flips(&rig.mocks), [2, 2, 2]);
        assert_eq!(
            bus.published(),
            vec![
                pair(TOPIC_POWER, "ON"),
                pair(TOPIC_POWER, "OFF"),
                pair(TOPIC_POWER, "ON"),
            ]
        );
    }

    #[test]
    fn test_expired_message_reverts_to_clock() {
        let bus = RecordingBus::default();
        let mut rig = rig(&bus);
        let config = DisplayConfig::default();
        rig.ctx.with_state(|s| s.set_message("OLD", 18, 0, &config));

        rig.panel_loop.tick();
        assert!(rig.ctx.with_state(|s| s.message().is_none()));
    }

    #[test]
    fn test_run_after_shutdown_switches_off() {
        let bus = RecordingBus::default();
        let mut rig = rig(&bus);
        rig.panel_loop.tick();
        assert!(rig.ctx.shutdown());

        rig.panel_loop.run();
        assert_eq!(rig.mocks[0].relay(), Some(false));
        let panels = rig.panel_loop.into_panels();
        assert_eq!(panels.len(), PANEL_COUNT);
    }
}
