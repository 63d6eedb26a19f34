use std::sync::Arc;

use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};
use tokio::sync::watch;
use tracing::debug;

use crate::utils::RelayError;

/// Requests the relay makes of the broker connection.
///
/// Publish and subscribe wait until the client library has accepted the
/// request, not until the broker answers.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn subscribe(&self, topic: &str) -> Result<(), RelayError>;
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), RelayError>;
    async fn disconnect(&self) -> Result<(), RelayError>;
}

/// `BrokerClient` backed by a `rumqttc::AsyncClient`.
///
/// The event loop must be polled from its own task (see
/// `event_loop::run`), otherwise awaited requests back up behind it.
#[derive(Debug)]
pub struct MqttBroker {
    client: AsyncClient,
    qos: QoS,
    shutdown: Arc<watch::Sender<bool>>,
}

impl MqttBroker {
    pub fn new(client: AsyncClient, qos: QoS) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            client,
            qos,
            shutdown: Arc::new(shutdown),
        }
    }

    /// Flips to `true` once `disconnect` has been called. The event loop
    /// watches it to stop reconnecting.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

#[async_trait]
impl BrokerClient for MqttBroker {
    async fn subscribe(&self, topic: &str) -> Result<(), RelayError> {
        debug!(topic, qos = ?self.qos, "queueing subscribe");
        self.client.subscribe(topic, self.qos).await?;
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), RelayError> {
        self.client
            .publish(topic, self.qos, false, payload.to_vec())
            .await?;
        Ok(())
    }

    /// Marks the session as shutting down and queues a DISCONNECT.
    ///
    /// Does not wait on the request queue: while the broker is unreachable
    /// nothing drains it, and the shutdown signal alone stops the loop.
    async fn disconnect(&self) -> Result<(), RelayError> {
        self.shutdown.send_replace(true);
        self.client.try_disconnect()?;
        Ok(())
    }
}
