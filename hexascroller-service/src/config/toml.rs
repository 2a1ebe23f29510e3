//! TOML configuration parsing
//!
//! Every section and key is optional; missing values fall back to the
//! defaults below, which match the embedded file.

use std::fs;
use std::path::{Path, PathBuf};

use hexascroller_core::config::{ConfigError as DisplayConfigError, DisplayConfig};
use hexascroller_hal::UartConfig;
use serde::Deserialize;
use thiserror::Error;

/// Embedded default configuration
pub const EMBEDDED_CONFIG: &str = include_str!("../../hexascroller.toml");

/// Broker host override
pub const ENV_BROKER: &str = "MQTT_BROKER";
/// Broker username override
pub const ENV_USER: &str = "MQTT_USER";
/// Broker password override
pub const ENV_PASSWORD: &str = "MQTT_PASS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] ::toml::de::Error),
    #[error("[display] {0}")]
    Display(#[from] DisplayConfigError),
    #[error("[panels] ports must list at least one port")]
    NoPorts,
    #[error("[mqtt] host must not be empty")]
    NoHost,
    #[error("[mqtt] keep_alive_s must be at least {} seconds", MIN_KEEP_ALIVE_S)]
    KeepAlive,
}

/// Shortest keep-alive the MQTT client accepts
pub const MIN_KEEP_ALIVE_S: u64 = 5;

/// Message bus connection settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keep_alive_s: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "homeassistant.local".to_string(),
            port: 1883,
            client_id: "hexascroller".to_string(),
            username: None,
            password: None,
            keep_alive_s: 30,
        }
    }
}

/// Panel link settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelsConfig {
    /// Candidate serial ports, probed in order
    pub ports: Vec<String>,
    pub baud: u32,
    /// Per-read timeout on a panel link
    pub timeout_ms: u32,
    /// Use emulated panels instead of serial ports
    pub simulate: bool,
}

impl Default for PanelsConfig {
    fn default() -> Self {
        Self {
            ports: (0..3).map(|n| format!("/dev/ttyACM{n}")).collect(),
            baud: 9600,
            timeout_ms: 500,
            simulate: false,
        }
    }
}

impl PanelsConfig {
    pub fn uart(&self) -> UartConfig {
        UartConfig {
            baudrate: self.baud,
            timeout_ms: self.timeout_ms,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub mqtt: MqttConfig,
    pub panels: PanelsConfig,
    pub display: DisplayConfig,
}

impl ServiceConfig {
    /// Parse configuration text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(::toml::from_str(text)?)
    }

    /// The configuration compiled into the binary
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml(EMBEDDED_CONFIG)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Apply `MQTT_BROKER`, `MQTT_USER` and `MQTT_PASS` overrides
    ///
    /// `lookup` is `std::env::var` in production.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup(ENV_BROKER) {
            self.mqtt.host = host;
        }
        if let Some(user) = lookup(ENV_USER) {
            self.mqtt.username = Some(user);
        }
        if let Some(pass) = lookup(ENV_PASSWORD) {
            self.mqtt.password = Some(pass);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.host.trim().is_empty() {
            return Err(ConfigError::NoHost);
        }
        if self.mqtt.keep_alive_s < MIN_KEEP_ALIVE_S {
            return Err(ConfigError::KeepAlive);
        }
        if self.panels.ports.is_empty() && !self.panels.simulate {
            return Err(ConfigError::NoPorts);
        }
        self.display.validate()?;
        Ok(())
    }
}
