//! Test doubles shared by the task tests

use std::sync::{Arc, Mutex};

use hexascroller_core::traits::panel::ResponsePayload;
use hexascroller_core::traits::{CommandError, PanelError, PanelLink};
use hexascroller_protocol::Opcode;

use crate::bus::{BusError, Publisher};
use crate::time::{Clock, WallTime};

pub fn pair(topic: &str, payload: &str) -> (String, String) {
    (topic.to_string(), payload.to_string())
}

/// Publisher that records everything it is asked to send
#[derive(Default)]
pub struct RecordingBus {
    pub published: Mutex<Vec<(String, String, bool)>>,
    pub subscribed: Mutex<Vec<String>>,
    pub disconnected: Mutex<bool>,
}

impl RecordingBus {
    /// Topic and payload of every publish, in order
    pub fn published(&self) -> Vec<(String, String)> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|(t, p, _)| (t.clone(), p.clone()))
            .collect()
    }
}

impl Publisher for RecordingBus {
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BusError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string(), retain));
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> Result<(), BusError> {
        self.subscribed.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    fn disconnect(&self) -> Result<(), BusError> {
        *self.disconnected.lock().unwrap() = true;
        Ok(())
    }
}

pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> WallTime {
        WallTime {
            unix_ms: self.0,
            utc_offset_s: 0,
        }
    }
}

/// What a `MockPanel` has been asked to do
#[derive(Debug, Default)]
pub struct PanelLog {
    pub relay: Option<bool>,
    pub relay_commands: usize,
    pub flips: usize,
    pub opcodes: Vec<Opcode>,
}

/// Panel link that records commands and can be told to time out
#[derive(Clone, Default)]
pub struct MockPanel {
    pub log: Arc<Mutex<PanelLog>>,
    pub failing: Arc<Mutex<bool>>,
}

impl MockPanel {
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn flips(&self) -> usize {
        self.log.lock().unwrap().flips
    }

    pub fn relay(&self) -> Option<bool> {
        self.log.lock().unwrap().relay
    }
}

impl PanelLink for MockPanel {
    fn send_command(
        &mut self,
        opcode: Opcode,
        payload: &[u8],
    ) -> Result<ResponsePayload, PanelError> {
        let mut log = self.log.lock().unwrap();
        log.opcodes.push(opcode);
        if *self.failing.lock().unwrap() {
            return Err(CommandError::Timeout {
                opcode: opcode.as_byte(),
            }
            .into());
        }
        match opcode {
            Opcode::Relay => {
                log.relay = Some(payload.first() == Some(&1));
                log.relay_commands += 1;
            }
            Opcode::FlipBuffers => log.flips += 1,
            _ => {}
        }
        Ok(ResponsePayload::new())
    }
}
