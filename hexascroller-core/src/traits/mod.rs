//! Hardware abstraction traits
//!
//! These traits define the interface between the display logic
//! and the transport-specific panel implementations.

pub mod panel;

pub use panel::{CommandError, ConnectionError, PanelError, PanelLink, ValidationError};
