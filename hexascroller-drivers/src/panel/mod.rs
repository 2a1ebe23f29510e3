//! Panel links and discovery

mod discovery;
mod link;

pub use discovery::{discover, DiscoveryError};
pub use link::SerialPanel;
