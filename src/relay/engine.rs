use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::broker::{BrokerClient, ConnectCode};
use crate::cloud::CloudSink;
use crate::config::RelaySettings;
use crate::relay::{EventHandler, Message};
use crate::utils::RelayError;

/// The relay context.
///
/// Built once at startup and moved into the event-loop worker. Subscribes to
/// the configured topics on a successful connect, acknowledges every message
/// on `<topic><ack_suffix>`, and forwards the text to the cloud sink when one
/// is configured.
pub struct Relay {
    broker: Arc<dyn BrokerClient>,
    sink: Option<Box<dyn CloudSink>>,
    settings: RelaySettings,
}

impl Relay {
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        sink: Option<Box<dyn CloudSink>>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            broker,
            sink,
            settings,
        }
    }

    pub fn topics(&self) -> &[String] {
        &self.settings.topics
    }

    pub fn forwards_to_cloud(&self) -> bool {
        self.sink.is_some()
    }

    async fn acknowledge(&self, message: &Message) {
        let topic = message.ack_topic(&self.settings.ack_suffix);
        if let Err(e) = self
            .broker
            .publish(&topic, self.settings.ack_payload.as_bytes())
            .await
        {
            warn!("Failed to publish acknowledgment to '{topic}': {e}");
        }
    }

    async fn forward(&self, message: &Message) {
        let Some(sink) = &self.sink else {
            return;
        };

        match sink.send(&message.payload).await {
            Ok(()) => info!("Forwarded message from '{}' to cloud", message.topic),
            Err(e) => error!("Error sending message to cloud: {e}"),
        }
    }
}

#[async_trait]
impl EventHandler for Relay {
    async fn on_connect(&mut self, code: ConnectCode) {
        if !code.is_success() {
            error!("Connection failed with result code: {code}");
            return;
        }

        info!("Connected to MQTT broker with result code: {code}");
        for topic in &self.settings.topics {
            match self.broker.subscribe(topic).await {
                Ok(()) => info!("Subscribed to '{topic}'"),
                Err(e) => warn!("Failed to subscribe to '{topic}': {e}"),
            }
        }
    }

    async fn on_message(&mut self, topic: &str, payload: &[u8]) -> Result<(), RelayError> {
        let message = Message::decode(topic, payload)?;
        info!(
            "Received message on topic '{}': {}",
            message.topic, message.payload
        );

        // ack and forward are independent; a failed ack does not skip the forward
        self.acknowledge(&message).await;
        self.forward(&message).await;

        Ok(())
    }
}
