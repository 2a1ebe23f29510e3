//! Control events decoded from the message bus
//!
//! Topic names and switch payloads follow the Home Assistant MQTT
//! switch conventions (`ON`/`OFF`, `online`/`offline`).

/// Common prefix of every topic
pub const TOPIC_PREFIX: &str = "hexascroller";

/// Power state echo (published)
pub const TOPIC_POWER: &str = "hexascroller/power";
/// Power commands (subscribed)
pub const TOPIC_POWER_SET: &str = "hexascroller/power/set";
/// Invert state echo (published)
pub const TOPIC_INVERT: &str = "hexascroller/invert";
/// Invert commands (subscribed)
pub const TOPIC_INVERT_SET: &str = "hexascroller/invert/set";
/// Messages to scroll (subscribed)
pub const TOPIC_MESSAGE: &str = "hexascroller/message";
/// Service availability (published, also the last will)
pub const TOPIC_AVAILABLE: &str = "hexascroller/available";

/// Topics the control surface subscribes to
pub const SUBSCRIPTIONS: [&str; 3] = [TOPIC_POWER_SET, TOPIC_INVERT_SET, TOPIC_MESSAGE];

pub const PAYLOAD_ON: &str = "ON";
pub const PAYLOAD_OFF: &str = "OFF";
pub const PAYLOAD_ONLINE: &str = "online";
pub const PAYLOAD_OFFLINE: &str = "offline";

/// Malformed or unrecognized inbound bus message
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unrecognized topic")]
    UnknownTopic,
    #[error("switch payload must be ON or OFF")]
    InvalidSwitch,
    #[error("message payload is not valid UTF-8")]
    InvalidUtf8,
}

/// A state-changing command received from the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent<'a> {
    /// Energize or de-energize the panels
    PowerSet(bool),
    /// Enable or disable bitmap inversion
    InvertSet(bool),
    /// Show a message for the configured duration
    Message(&'a str),
}

impl<'a> ControlEvent<'a> {
    /// Decode a bus message
    pub fn parse(topic: &str, payload: &'a [u8]) -> Result<Self, ProtocolError> {
        match topic {
            TOPIC_POWER_SET => parse_switch(payload).map(ControlEvent::PowerSet),
            TOPIC_INVERT_SET => parse_switch(payload).map(ControlEvent::InvertSet),
            TOPIC_MESSAGE => core::str::from_utf8(payload)
                .map(ControlEvent::Message)
                .map_err(|_| ProtocolError::InvalidUtf8),
            _ => Err(ProtocolError::UnknownTopic),
        }
    }
}

/// Parse an exact `ON`/`OFF` payload
pub fn parse_switch(payload: &[u8]) -> Result<bool, ProtocolError> {
    match payload {
        b"ON" => Ok(true),
        b"OFF" => Ok(false),
        _ => Err(ProtocolError::InvalidSwitch),
    }
}

/// Payload used when publishing a switch state
pub const fn switch_payload(on: bool) -> &'static str {
    if on {
        PAYLOAD_ON
    } else {
        PAYLOAD_OFF
    }
}
