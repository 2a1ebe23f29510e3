//! Panel link implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in hexascroller-core:
//!
//! - `SerialPanel`: the command protocol over any `hexascroller_hal::Uart`
//! - Discovery: probe candidate links and assign them to logical slots

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod panel;
