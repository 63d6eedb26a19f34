//! The `cloud` module forwards relayed payloads to Azure IoT Hub.
//!
//! The hub is reached over its HTTPS device-to-cloud endpoint and
//! authenticated with a SAS token derived from the device connection string.

pub mod connection_string;
pub mod iothub;
pub mod sas;
pub mod sink;

pub use connection_string::IotHubConnectionString;
pub use iothub::IotHubSink;
pub use sink::CloudSink;
