use async_trait::async_trait;

use crate::broker::ConnectCode;
use crate::utils::RelayError;

/// Callbacks the broker event loop invokes, one at a time.
#[async_trait]
pub trait EventHandler: Send {
    /// Called for every CONNACK, including refused ones.
    async fn on_connect(&mut self, code: ConnectCode);

    /// Called once per delivered message. An error ends the event loop.
    async fn on_message(&mut self, topic: &str, payload: &[u8]) -> Result<(), RelayError>;
}
