//! # edgerelay
//!
//! `edgerelay` is an edge-device bridge. It subscribes to a fixed set of MQTT
//! topics, acknowledges every message it receives on `<topic>/ack`, and can
//! forward each payload to an Azure IoT Hub as device-to-cloud telemetry.
//!
//! ## Core Modules
//!
//! - `relay`: the message relay and the event-handler interface it implements.
//! - `broker`: the MQTT client abstraction, session setup and the event loop.
//! - `cloud`: the cloud telemetry sink and IoT Hub authentication.
//! - `config`: loading settings from file and environment.
//! - `utils`: error types and logging.

pub mod broker;
pub mod cloud;
pub mod config;
pub mod relay;
pub mod utils;

#[cfg(test)]
mod test_support;
