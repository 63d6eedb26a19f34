use std::time::Duration;

use rumqttc::QoS;
use serde::Deserialize;

/// Top-level configuration settings for the relay.
///
/// Read once at startup and never mutated afterwards.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub broker: BrokerSettings,
    pub relay: RelaySettings,
    pub cloud: CloudSettings,
    pub log: LogSettings,
}

/// Connection settings for the MQTT broker.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Client ids are `<prefix>-<uuid>`, regenerated on every start.
    pub client_id_prefix: String,
    /// Persistent session unless set to true.
    pub clean_session: bool,
    pub keep_alive_secs: u64,
    /// 0, 1 or 2. Anything else is treated as 0.
    pub qos: u8,
    pub reconnect_delay_secs: u64,
    pub channel_capacity: usize,
}

/// What the relay subscribes to and how it acknowledges.
#[derive(Debug, Deserialize, Clone)]
pub struct RelaySettings {
    pub topics: Vec<String>,
    pub ack_suffix: String,
    pub ack_payload: String,
}

/// Cloud forwarding. Forwarding is off when `connection_string` is unset.
#[derive(Debug, Deserialize, Clone)]
pub struct CloudSettings {
    pub connection_string: Option<String>,
    /// Overrides `https://<HostName>`.
    pub endpoint: Option<String>,
    pub api_version: String,
    pub token_ttl_secs: u64,
    pub timeout_secs: u64,
}

/// Logging configuration; `level` is one of error, warn, info, debug, trace.
#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

impl BrokerSettings {
    pub fn qos(&self) -> QoS {
        match self.qos {
            1 => QoS::AtLeastOnce,
            2 => QoS::ExactlyOnce,
            _ => QoS::AtMostOnce,
        }
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl CloudSettings {
    pub fn forwarding_enabled(&self) -> bool {
        self.connection_string
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub broker: Option<PartialBrokerSettings>,
    pub relay: Option<PartialRelaySettings>,
    pub cloud: Option<PartialCloudSettings>,
    pub log: Option<PartialLogSettings>,
}

/// Partial broker settings.
///
/// Used when loading broker connection settings from external sources with optional values.
#[derive(Debug, Deserialize, Default)]
pub struct PartialBrokerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id_prefix: Option<String>,
    pub clean_session: Option<bool>,
    pub keep_alive_secs: Option<u64>,
    pub qos: Option<u8>,
    pub reconnect_delay_secs: Option<u64>,
    pub channel_capacity: Option<usize>,
}

/// Partial relay settings.
///
/// Topics and acknowledgment shape; missing values keep the defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialRelaySettings {
    pub topics: Option<Vec<String>>,
    pub ack_suffix: Option<String>,
    pub ack_payload: Option<String>,
}

/// Partial cloud settings.
///
/// An absent `connection_string` leaves forwarding off.
#[derive(Debug, Deserialize, Default)]
pub struct PartialCloudSettings {
    pub connection_string: Option<String>,
    pub endpoint: Option<String>,
    pub api_version: Option<String>,
    pub token_ttl_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}

/// Partial logging settings.
#[derive(Debug, Deserialize, Default)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl PartialSettings {
    /// Fills every missing value from `defaults`.
    pub fn merge(self, defaults: Settings) -> Settings {
        let broker = self.broker.unwrap_or_default();
        let relay = self.relay.unwrap_or_default();
        let cloud = self.cloud.unwrap_or_default();
        let log = self.log.unwrap_or_default();

        Settings {
            broker: BrokerSettings {
                host: broker.host.unwrap_or(defaults.broker.host),
                port: broker.port.unwrap_or(defaults.broker.port),
                username: broker.username.unwrap_or(defaults.broker.username),
                password: broker.password.unwrap_or(defaults.broker.password),
                client_id_prefix: broker
                    .client_id_prefix
                    .unwrap_or(defaults.broker.client_id_prefix),
                clean_session: broker
                    .clean_session
                    .unwrap_or(defaults.broker.clean_session),
                keep_alive_secs: broker
                    .keep_alive_secs
                    .unwrap_or(defaults.broker.keep_alive_secs),
                qos: broker.qos.unwrap_or(defaults.broker.qos),
                reconnect_delay_secs: broker
                    .reconnect_delay_secs
                    .unwrap_or(defaults.broker.reconnect_delay_secs),
                channel_capacity: broker
                    .channel_capacity
                    .unwrap_or(defaults.broker.channel_capacity),
            },
            relay: RelaySettings {
                topics: relay.topics.unwrap_or(defaults.relay.topics),
                ack_suffix: relay.ack_suffix.unwrap_or(defaults.relay.ack_suffix),
                ack_payload: relay.ack_payload.unwrap_or(defaults.relay.ack_payload),
            },
            cloud: CloudSettings {
                connection_string: cloud
                    .connection_string
                    .or(defaults.cloud.connection_string),
                endpoint: cloud.endpoint.or(defaults.cloud.endpoint),
                api_version: cloud.api_version.unwrap_or(defaults.cloud.api_version),
                token_ttl_secs: cloud
                    .token_ttl_secs
                    .unwrap_or(defaults.cloud.token_ttl_secs),
                timeout_secs: cloud.timeout_secs.unwrap_or(defaults.cloud.timeout_secs),
            },
            log: LogSettings {
                level: log.level.unwrap_or(defaults.log.level),
            },
        }
    }
}

/// Provides default values for `Settings`.
///
/// The defaults talk to a local broker on 1883 with no credentials and
/// subscribe to `edge/temp`.
impl Default for Settings {
    fn default() -> Self {
        Self {
            broker: BrokerSettings {
                host: "localhost".to_string(),
                port: 1883,
                username: String::new(),
                password: String::new(),
                client_id_prefix: "mqtt-client".to_string(),
                clean_session: false,
                keep_alive_secs: 60,
                qos: 0,
                reconnect_delay_secs: 1,
                channel_capacity: 10,
            },
            relay: RelaySettings {
                topics: vec!["edge/temp".to_string()],
                ack_suffix: "/ack".to_string(),
                ack_payload: "Received".to_string(),
            },
            cloud: CloudSettings {
                connection_string: None,
                endpoint: None,
                api_version: "2020-03-13".to_string(),
                token_ttl_secs: 3600,
                timeout_secs: 10,
            },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}
