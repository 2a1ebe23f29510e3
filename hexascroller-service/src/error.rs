//! Service-level errors
//!
//! Everything that can stop the process. Per-tick panel failures and bad
//! bus messages never reach this type; they are logged where they happen.

use std::io;
use std::path::PathBuf;

use hexascroller_core::traits::PanelError;
use hexascroller_drivers::panel::DiscoveryError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid arguments: {0}")]
    Usage(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("panel command failed: {0}")]
    Panel(#[from] PanelError),

    #[error("could not load image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("could not install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("could not start thread: {0}")]
    Thread(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, ServiceError>;
