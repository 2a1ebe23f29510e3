//! Host implementations of the UART traits
//!
//! `SerialUart` talks to a real panel over a USB serial port.
//! `LoopbackUart` answers in-process like a panel would, for running
//! without hardware.

mod loopback;
mod serial;

pub use loopback::{EmulatedPanel, LoopbackUart};
pub use serial::{SerialError, SerialUart};
