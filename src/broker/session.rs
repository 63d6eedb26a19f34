//! Session setup: client ids, connect options and CONNACK codes.

use std::fmt;

use rumqttc::{AsyncClient, ConnectReturnCode, EventLoop, MqttOptions};
use uuid::Uuid;

use crate::config::BrokerSettings;

/// Generates `<prefix>-<uuid v4>` so restarts never collide on a session.
pub fn client_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

/// Builds connect options for `settings` under the given client id.
///
/// Credentials are only sent when a username is configured.
pub fn mqtt_options(settings: &BrokerSettings, client_id: String) -> MqttOptions {
    let mut opts = MqttOptions::new(client_id, settings.host.clone(), settings.port);
    opts.set_keep_alive(settings.keep_alive());
    opts.set_clean_session(settings.clean_session);

    if !settings.username.is_empty() {
        opts.set_credentials(settings.username.clone(), settings.password.clone());
    }

    opts
}

/// Creates the client handle and the event loop that drives it.
///
/// Nothing touches the network until the event loop is first polled.
pub fn connect(settings: &BrokerSettings, client_id: String) -> (AsyncClient, EventLoop) {
    AsyncClient::new(mqtt_options(settings, client_id), settings.channel_capacity)
}

/// The MQTT 3.1.1 CONNACK return code, 0 meaning success.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectCode(pub u8);

impl ConnectCode {
    pub const SUCCESS: ConnectCode = ConnectCode(0);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<ConnectReturnCode> for ConnectCode {
    fn from(code: ConnectReturnCode) -> Self {
        ConnectCode(match code {
            ConnectReturnCode::Success => 0,
            ConnectReturnCode::RefusedProtocolVersion => 1,
            ConnectReturnCode::BadClientId => 2,
            ConnectReturnCode::ServiceUnavailable => 3,
            ConnectReturnCode::BadUserNamePassword => 4,
            ConnectReturnCode::NotAuthorized => 5,
        })
    }
}

impl fmt::Display for ConnectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
