//! Rendering for Hexascroller LED panels
//!
//! This crate provides:
//! - `MonoImage`, a column-packed monochrome pixel grid usable as an
//!   `embedded-graphics` draw target
//! - The bitmap compiler that turns any `PixelGrid` window into panel
//!   wire bytes
//! - Text measurement and drawing with `embedded-graphics` mono fonts
//! - `RenderEngine`, which turns a display state snapshot into a bitmap
//!
//! # Panel format
//!
//! A panel is 120 columns by 7 rows. A compiled bitmap is one byte per
//! column; row `r` is bit `7 - r`, so bit 0 is always clear.
//!
//! ```text
//!   column  0    1    2   ...  119
//!   row 0   b7   b7   b7       b7
//!   row 1   b6   b6   b6       b6
//!    ...
//!   row 6   b1   b1   b1       b1
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bitmap;
pub mod font;
pub mod image;
pub mod renderer;

pub use bitmap::{compile_image, compile_panel, compile_window, decode_bitmap, invert};
pub use font::{Font, CLOCK_FONT, MESSAGE_FONT};
pub use image::{MonoImage, PanelImage, PixelGrid};
pub use renderer::RenderEngine;
