//! MQTT bus adapter
//!
//! Publishing never blocks: a full request queue drops the message and the
//! caller logs it.

use std::time::Duration;

use hexascroller_core::state::events::{PAYLOAD_OFFLINE, TOPIC_AVAILABLE};
use rumqttc::{Client, ClientError, Connection, LastWill, MqttOptions, QoS};
use thiserror::Error;

use crate::config::MqttConfig;

/// Outgoing request queue depth
const REQUEST_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("mqtt request rejected: {0}")]
    Client(#[from] ClientError),
}

/// Sink for outbound bus messages
pub trait Publisher {
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BusError>;

    fn subscribe(&self, _topic: &str) -> Result<(), BusError> {
        Ok(())
    }

    fn disconnect(&self) -> Result<(), BusError> {
        Ok(())
    }
}

impl<P: Publisher + ?Sized> Publisher for &P {
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BusError> {
        (**self).publish(topic, payload, retain)
    }

    fn subscribe(&self, topic: &str) -> Result<(), BusError> {
        (**self).subscribe(topic)
    }

    fn disconnect(&self) -> Result<(), BusError> {
        (**self).disconnect()
    }
}

/// Publisher backed by a rumqttc client handle
#[derive(Clone)]
pub struct MqttPublisher {
    client: Client,
}

impl MqttPublisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Publisher for MqttPublisher {
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BusError> {
        self.client
            .try_publish(topic, QoS::AtLeastOnce, retain, payload.as_bytes().to_vec())?;
        Ok(())
    }

    fn subscribe(&self, topic: &str) -> Result<(), BusError> {
        self.client.try_subscribe(topic, QoS::AtLeastOnce)?;
        Ok(())
    }

    fn disconnect(&self) -> Result<(), BusError> {
        self.client.try_disconnect()?;
        Ok(())
    }
}

/// Connection options; the broker marks us offline if we vanish
pub fn options(config: &MqttConfig) -> MqttOptions {
    let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_s));
    options.set_last_will(LastWill::new(
        TOPIC_AVAILABLE,
        PAYLOAD_OFFLINE,
        QoS::AtLeastOnce,
        true,
    ));
    if let Some(user) = &config.username {
        options.set_credentials(user, config.password.as_deref().unwrap_or_default());
    }
    options
}

/// Create the client handle and its event loop
///
/// Nothing touches the network until the connection is iterated.
pub fn connect(config: &MqttConfig) -> (Client, Connection) {
    Client::new(options(config), REQUEST_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options() {
        let config = MqttConfig {
            host: "broker.lan".to_string(),
            port: 1884,
            keep_alive_s: 15,
            username: Some("panel".to_string()),
            ..MqttConfig::default()
        };
        let options = options(&config);
        assert_eq!(options.broker_address(), ("broker.lan".to_string(), 1884));
        assert_eq!(options.keep_alive(), Duration::from_secs(15));
        assert_eq!(options.client_id(), "hexascroller");
        assert_eq!(
            options.credentials(),
            Some(("panel".to_string(), String::new()))
        );

        let will = options.last_will().unwrap();
        assert_eq!(will.topic, TOPIC_AVAILABLE);
        assert_eq!(&will.message[..], PAYLOAD_OFFLINE.as_bytes());
        assert!(will.retain);
    }

    #[test]
    fn test_anonymous_options() {
        let options = options(&MqttConfig::default());
        assert_eq!(options.credentials(), None);
    }

    #[test]
    fn test_publish_queues_without_network() {
        let (client, _connection) = connect(&MqttConfig::default());
        let publisher = MqttPublisher::new(client);
        publisher.publish("hexascroller/power", "ON", true).unwrap();
    }
}
