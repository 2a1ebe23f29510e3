//! Hexascroller host service
//!
//! Std side of the workspace: configuration, serial and loopback panel
//! transports, the MQTT control surface, the panel loop and the one-shot
//! maintenance jobs. The binary in `main.rs` wires them together.

pub mod args;
pub mod bus;
pub mod config;
pub mod context;
pub mod error;
pub mod hal;
pub mod maintenance;
pub mod tasks;
pub mod time;

#[cfg(test)]
mod testing;
