//! The `broker` module wraps the MQTT client library.
//!
//! - `client`: the `BrokerClient` requests the relay makes (subscribe,
//!   publish, disconnect) and the `rumqttc` implementation of them.
//! - `session`: connect options, client ids and CONNACK result codes.
//! - `event_loop`: polls the client library and turns its events into
//!   `EventHandler` callbacks.
//! - `ack_check`: publishes one message and waits for the relay's acknowledgment.

pub mod ack_check;
pub mod client;
pub mod event_loop;
pub mod session;

pub use client::{BrokerClient, MqttBroker};
pub use session::ConnectCode;
