//! Configuration types

mod types;

pub use types::*;
