//! Hardware-agnostic core logic for the Hexascroller display engine
//!
//! This crate contains everything that does not touch a serial port,
//! a clock source or the message bus:
//!
//! - Panel link trait and its error taxonomy
//! - Shared display state (message lifecycle, scroll position, write suppression)
//! - Active/Idle panel mode machine
//! - Inbound control events decoded from bus topics
//! - Swatch Internet Time and local wall-clock math
//! - Timing configuration types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod state;
pub mod traits;
