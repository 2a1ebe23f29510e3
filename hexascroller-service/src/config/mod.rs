//! Service configuration
//!
//! Loaded from TOML: the embedded `hexascroller.toml` by default, or a file
//! given with `--config`. Broker settings can be overridden from the
//! environment.

mod toml;

pub use self::toml::{
    ConfigError, MqttConfig, PanelsConfig, ServiceConfig, EMBEDDED_CONFIG, ENV_BROKER,
    ENV_PASSWORD, ENV_USER,
};
