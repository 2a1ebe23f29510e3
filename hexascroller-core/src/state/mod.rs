//! Display state and panel mode machine
//!
//! The display state is the single piece of data shared between the
//! control surface and the panel loop. Everything here is plain data;
//! locking is the caller's job.

pub mod display;
pub mod events;
pub mod machine;

pub use display::{Bitmap, DisplaySnapshot, DisplayState, MessageView, StateChange};
pub use events::{ControlEvent, ProtocolError};
pub use machine::{ModeEvent, PanelMode};
