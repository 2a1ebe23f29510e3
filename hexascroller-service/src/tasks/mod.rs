//! Service threads
//!
//! The control surface runs the MQTT event loop and writes the display
//! state. The panel loop reads it and drives the panels. They share only
//! the `Context`.

pub mod control;
pub mod panel_loop;

pub use control::Control;
pub use panel_loop::PanelLoop;
