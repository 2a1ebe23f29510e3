//! Hexascroller Hardware Abstraction Layer
//!
//! This crate defines the byte-channel traits the panel link protocol is
//! written against. The service provides two implementations: a physical
//! serial port and an in-process loopback panel.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  hexascroller-drivers (panel protocol)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  hexascroller-hal (this crate - traits) │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  serial port  │       │   loopback    │
//! └───────────────┘       └───────────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod uart;

pub use uart::{Uart, UartConfig, UartError, UartErrorKind, UartRx, UartTx};
