//! One-shot publisher used to check a running relay end to end.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, Outgoing, Packet, QoS};
use tracing::info;

use crate::broker::session;
use crate::config::Settings;
use crate::utils::RelayError;

/// Publishes `payload` to `topic` once the ack topic is subscribed, waits
/// for the acknowledgment and disconnects cleanly.
///
/// Returns the acknowledgment payload.
pub async fn round_trip(
    settings: &Settings,
    topic: &str,
    payload: &str,
    timeout: Duration,
) -> Result<String, RelayError> {
    let mut opts = session::mqtt_options(
        &settings.broker,
        session::client_id(&format!("{}-check", settings.broker.client_id_prefix)),
    );
    opts.set_clean_session(true);
    let (client, mut eventloop) = AsyncClient::new(opts, 10);

    let ack_topic = format!("{topic}{}", settings.relay.ack_suffix);

    let exchange = async {
        let mut ack = None;
        loop {
            match eventloop.poll().await? {
                Event::Incoming(Packet::ConnAck(_)) => {
                    client.subscribe(&ack_topic, QoS::AtLeastOnce).await?;
                }
                Event::Incoming(Packet::SubAck(_)) => {
                    client
                        .publish(topic, QoS::AtLeastOnce, false, payload.as_bytes().to_vec())
                        .await?;
                    info!("Published '{payload}' to '{topic}'");
                }
                Event::Incoming(Packet::Publish(p)) if p.topic == ack_topic && ack.is_none() => {
                    ack = Some(String::from_utf8_lossy(&p.payload).into_owned());
                    client.disconnect().await?;
                }
                Event::Outgoing(Outgoing::Disconnect) => {
                    return Ok::<_, RelayError>(ack.unwrap_or_default());
                }
                _ => {}
            }
        }
    };

    tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| RelayError::Timeout(timeout.as_secs()))?
}
