//! Hexascroller Panel Communication Protocol
//!
//! This crate defines the request/response protocol between the host and
//! each LED matrix panel. Every exchange is one request frame followed by
//! exactly one response frame:
//!
//! ```text
//! request   ┌────────┬────────┬─────────────┐
//!           │ OPCODE │ LENGTH │ PAYLOAD     │
//!           │ 1B     │ 1B     │ 0–255B      │
//!           └────────┴────────┴─────────────┘
//! response  ┌────────┬────────┬─────────────┐
//!           │ STATUS │ LENGTH │ PAYLOAD     │
//!           │ 1B     │ 1B     │ 0–255B      │
//!           └────────┴────────┴─────────────┘
//! ```
//!
//! There is no start byte or checksum; the link is a point-to-point USB CDC
//! channel and resynchronisation happens by flushing after a timeout.
//! Opcode values are fixed by the panel firmware.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;

pub use frame::{
    Frame, FrameError, FrameParser, Response, ResponseHeader, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE,
};
pub use messages::{
    Opcode, PanelCommand, HALF_WIDTH, PANEL_BYTES, PANEL_HEIGHT, PANEL_WIDTH, STATUS_ERROR,
    STATUS_OK,
};
