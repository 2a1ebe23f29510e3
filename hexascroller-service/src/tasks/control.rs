//! Control surface
//!
//! Drives the MQTT event loop. Inbound messages on the `set` topics become
//! `ControlEvent`s applied to the display state; power and invert changes
//! are echoed back retained. Publishing happens after the lock is released.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hexascroller_core::state::display::MAX_MESSAGE_LEN;
use hexascroller_core::state::events::{
    switch_payload, PAYLOAD_OFF, PAYLOAD_OFFLINE, PAYLOAD_ONLINE, SUBSCRIPTIONS, TOPIC_AVAILABLE,
    TOPIC_INVERT, TOPIC_POWER,
};
use hexascroller_core::state::{ControlEvent, StateChange};
use hexascroller_display::MESSAGE_FONT;
use rumqttc::{Connection, Event, Outgoing, Packet};

use crate::bus::Publisher;
use crate::context::Context;
use crate::time::Clock;

/// Pause before polling the event loop again after a connection error
const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);

pub struct Control<P, C> {
    ctx: Arc<Context>,
    bus: P,
    clock: C,
}

impl<P: Publisher, C: Clock> Control<P, C> {
    pub fn new(ctx: Arc<Context>, bus: P, clock: C) -> Self {
        Self { ctx, bus, clock }
    }

    fn publish(&self, topic: &str, payload: &str) {
        if let Err(e) = self.bus.publish(topic, payload, true) {
            log::warn!("publish {topic}={payload} failed: {e}");
        }
    }

    /// Announce availability and current state, then subscribe
    ///
    /// Called on every (re)connect; the broker forgets subscriptions of a
    /// clean session.
    pub fn announce(&self) {
        let (powered, inverted) = self.ctx.with_state(|s| (s.powered(), s.inverted()));
        self.publish(TOPIC_AVAILABLE, PAYLOAD_ONLINE);
        self.publish(TOPIC_POWER, switch_payload(powered));
        self.publish(TOPIC_INVERT, switch_payload(inverted));
        for topic in SUBSCRIPTIONS {
            if let Err(e) = self.bus.subscribe(topic) {
                log::warn!("subscribe {topic} failed: {e}");
            }
        }
    }

    /// Apply one inbound message; malformed ones are logged and dropped
    pub fn handle_publish(&self, topic: &str, payload: &[u8]) -> Option<StateChange> {
        let event = match ControlEvent::parse(topic, payload) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("ignoring message on {topic}: {e}");
                return None;
            }
        };

        let now_ms = self.clock.now().millis();
        let config = &self.ctx.display;
        let measure = |text: &str| MESSAGE_FONT.string_width(text);
        let change = self.ctx.with_state(|s| s.apply(&event, now_ms, config, measure));

        match change {
            StateChange::Power(on) => {
                log::info!("power {}", switch_payload(on));
                self.publish(TOPIC_POWER, switch_payload(on));
            }
            StateChange::Invert(on) => {
                log::info!("invert {}", switch_payload(on));
                self.publish(TOPIC_INVERT, switch_payload(on));
            }
            StateChange::Message { truncated } => {
                if truncated {
                    log::warn!("message truncated to {MAX_MESSAGE_LEN} bytes");
                }
                if let ControlEvent::Message(text) = event {
                    log::info!("message {text:?} for {} s", config.duration_s);
                }
            }
        }
        Some(change)
    }

    /// Poll the event loop until the client disconnects
    ///
    /// Connection errors are logged and retried after a back-off; the
    /// client reconnects on the next poll. Once shutdown is requested the
    /// loop keeps polling so `farewell` gets flushed, and stops at the
    /// outgoing disconnect or the first error.
    pub fn run(&self, connection: &mut Connection) {
        for notification in connection.iter() {
            match notification {
                Ok(Event::Incoming(Packet::ConnAck(_))) if self.ctx.is_running() => {
                    log::info!("connected to broker");
                    self.announce();
                }
                Ok(Event::Incoming(Packet::Publish(publish))) if self.ctx.is_running() => {
                    self.handle_publish(&publish.topic, &publish.payload);
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                Ok(event) => log::trace!("mqtt {event:?}"),
                Err(e) => {
                    if !self.ctx.is_running() {
                        break;
                    }
                    log::warn!("broker connection: {e}");
                    thread::sleep(RECONNECT_BACKOFF);
                }
            }
        }
        log::debug!("control loop stopped");
    }

    /// Publish the shutdown state and disconnect
    ///
    /// Safe to call with the broker already gone.
    pub fn farewell(&self) {
        self.publish(TOPIC_POWER, PAYLOAD_OFF);
        self.publish(TOPIC_AVAILABLE, PAYLOAD_OFFLINE);
        if let Err(e) = self.bus.disconnect() {
            log::debug!("disconnect: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pair, FixedClock, RecordingBus};
    use hexascroller_core::config::DisplayConfig;
    use hexascroller_core::state::events::{TOPIC_INVERT_SET, TOPIC_MESSAGE, TOPIC_POWER_SET};

    const T: i64 = 1_700_000_000_000;

    fn control(bus: &RecordingBus) -> Control<&RecordingBus, FixedClock> {
        let ctx = Arc::new(Context::new(DisplayConfig::default()));
        Control::new(ctx, bus, FixedClock(T))
    }

    #[test]
    fn test_announce() {
        let bus = RecordingBus::default();
        control(&bus).announce();
        assert_eq!(
            bus.published(),
            vec![
                pair(TOPIC_AVAILABLE, "online"),
                pair(TOPIC_POWER, "ON"),
                pair(TOPIC_INVERT, "OFF"),
            ]
        );
        assert!(bus.published.lock().unwrap().iter().all(|(_, _, r)| *r));
        assert_eq!(*bus.subscribed.lock().unwrap(), SUBSCRIPTIONS.to_vec());
    }

    #[test]
    fn test_power_echo() {
        let bus = RecordingBus::default();
        let control = control(&bus);
        assert_eq!(
            control.handle_publish(TOPIC_POWER_SET, b"OFF"),
            Some(StateChange::Power(false))
        );
        assert!(!control.ctx.with_state(|s| s.powered()));
        assert_eq!(bus.published(), vec![pair(TOPIC_POWER, "OFF")]);
    }

    #[test]
    fn test_invert_echo() {
        let bus = RecordingBus::default();
        let control = control(&bus);
        control.handle_publish(TOPIC_INVERT_SET, b"ON");
        assert!(control.ctx.with_state(|s| s.inverted()));
        assert_eq!(bus.published(), vec![pair(TOPIC_INVERT, "ON")]);
    }

    #[test]
    fn test_invalid_switch_ignored() {
        let bus = RecordingBus::default();
        let control = control(&bus);
        assert_eq!(control.handle_publish(TOPIC_POWER_SET, b"on"), None);
        assert_eq!(control.handle_publish("hexascroller/other", b"ON"), None);
        assert!(control.ctx.with_state(|s| s.powered()));
        assert!(bus.published().is_empty());
    }

    #[test]
    fn test_message_sets_expiry_and_width() {
        let bus = RecordingBus::default();
        let control = control(&bus);
        let change = control.handle_publish(TOPIC_MESSAGE, b"HELLO");
        assert_eq!(change, Some(StateChange::Message { truncated: false }));

        let (text, expiry, interval) = control.ctx.with_state(|s| {
            (
                s.message().map(str::to_string),
                s.message_expiry(),
                s.scroll_interval(),
            )
        });
        assert_eq!(text.as_deref(), Some("HELLO"));
        assert_eq!(expiry, Some(T as u64 + 30_000));
        // Fits the panel, so it never scrolls
        assert_eq!(interval, 0.0);
        // Messages are not echoed
        assert!(bus.published().is_empty());
    }

    #[test]
    fn test_long_message_scrolls() {
        let bus = RecordingBus::default();
        let control = control(&bus);
        let text = "x".repeat(40);
        control.handle_publish(TOPIC_MESSAGE, text.as_bytes());
        let interval = control.ctx.with_state(|s| s.scroll_interval());
        assert!(interval > 0.0);
    }

    #[test]
    fn test_invalid_utf8_ignored() {
        let bus = RecordingBus::default();
        let control = control(&bus);
        assert_eq!(control.handle_publish(TOPIC_MESSAGE, &[0xff, 0xfe]), None);
        assert!(control.ctx.with_state(|s| s.message().is_none()));
    }

    #[test]
    fn test_farewell() {
        let bus = RecordingBus::default();
        control(&bus).farewell();
        assert_eq!(
            bus.published(),
            vec![pair(TOPIC_POWER, "OFF"), pair(TOPIC_AVAILABLE, "offline")]
        );
        assert!(*bus.disconnected.lock().unwrap());
    }
}
