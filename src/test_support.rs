//! Fakes for the broker, the cloud sink and the event handler, plus a
//! minimal MQTT 3.1.1 broker on a local socket.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::broker::{BrokerClient, ConnectCode};
use crate::cloud::CloudSink;
use crate::relay::{EventHandler, Message};
use crate::utils::{RelayError, SinkError};

/// Records every request instead of talking to a broker.
#[derive(Default)]
pub struct RecordingBroker {
    pub subscriptions: Mutex<Vec<String>>,
    pub publishes: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail_publish: bool,
    pub fail_subscribe_to: Option<String>,
}

impl RecordingBroker {
    pub fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn publishes(&self) -> Vec<(String, Vec<u8>)> {
        self.publishes.lock().unwrap().clone()
    }
}

fn closed_channel() -> RelayError {
    let (client, eventloop) = rumqttc::AsyncClient::new(
        rumqttc::MqttOptions::new("closed", "localhost", 1883),
        1,
    );
    drop(eventloop);
    match client.try_disconnect() {
        Err(e) => RelayError::Client(e),
        Ok(()) => RelayError::Timeout(0),
    }
}

#[async_trait]
impl BrokerClient for RecordingBroker {
    async fn subscribe(&self, topic: &str) -> Result<(), RelayError> {
        if self.fail_subscribe_to.as_deref() == Some(topic) {
            return Err(closed_channel());
        }
        self.subscriptions.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), RelayError> {
        self.publishes
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_vec()));
        if self.fail_publish {
            return Err(closed_channel());
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), RelayError> {
        Ok(())
    }
}

/// Records payloads; fails every call whose payload is in `fail_on`.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub sent: Arc<Mutex<Vec<String>>>,
    pub fail_on: Vec<String>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CloudSink for RecordingSink {
    async fn send(&self, payload: &str) -> Result<(), SinkError> {
        self.sent.lock().unwrap().push(payload.to_string());
        if self.fail_on.iter().any(|p| p == payload) {
            return Err(SinkError::Rejected {
                status: 500,
                body: "hub unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// Records callbacks; with `fail_messages` it decodes payloads like the relay.
#[derive(Default)]
pub struct RecordingHandler {
    pub connects: Vec<ConnectCode>,
    pub messages: Vec<(String, Vec<u8>)>,
    pub fail_messages: bool,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn on_connect(&mut self, code: ConnectCode) {
        self.connects.push(code);
    }

    async fn on_message(&mut self, topic: &str, payload: &[u8]) -> Result<(), RelayError> {
        if self.fail_messages {
            Message::decode(topic, payload)?;
        }
        self.messages.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}

pub const CONNECT: u8 = 1;
pub const PUBLISH: u8 = 3;
pub const SUBSCRIBE: u8 = 8;
pub const PINGREQ: u8 = 12;
pub const DISCONNECT: u8 = 14;

/// Accepts a single client on 127.0.0.1, answers its CONNECT with
/// `connack_code`, writes `after_connack` in one go and then reports every
/// packet the client sends as `(packet type, body)`.
///
/// SUBSCRIBE is granted QoS 0 and PINGREQ is answered.
pub struct FakeBroker {
    pub addr: SocketAddr,
    packets: mpsc::UnboundedReceiver<(u8, Vec<u8>)>,
}

impl FakeBroker {
    pub async fn start(connack_code: u8, after_connack: Vec<u8>) -> FakeBroker {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, packets) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            match read_packet(&mut stream).await {
                Ok(Some((header, _))) if header >> 4 == CONNECT => {}
                _ => return,
            }
            stream
                .write_all(&[0x20, 0x02, 0x00, connack_code])
                .await
                .unwrap();
            if !after_connack.is_empty() {
                stream.write_all(&after_connack).await.unwrap();
            }

            while let Ok(Some((header, body))) = read_packet(&mut stream).await {
                let kind = header >> 4;
                match kind {
                    SUBSCRIBE => {
                        let suback = [0x90, 0x03, body[0], body[1], 0x00];
                        let _ = stream.write_all(&suback).await;
                    }
                    PINGREQ => {
                        let _ = stream.write_all(&[0xd0, 0x00]).await;
                    }
                    _ => {}
                }
                let _ = tx.send((kind, body));
                if kind == DISCONNECT {
                    break;
                }
            }
        });

        FakeBroker { addr, packets }
    }

    /// The next client packet, or `None` after 5s or once the client is gone.
    pub async fn next_packet(&mut self) -> Option<(u8, Vec<u8>)> {
        tokio::time::timeout(Duration::from_secs(5), self.packets.recv())
            .await
            .ok()
            .flatten()
    }

    /// Skips packets until one of `kind` arrives.
    pub async fn next_of(&mut self, kind: u8) -> Option<Vec<u8>> {
        while let Some((k, body)) = self.next_packet().await {
            if k == kind {
                return Some(body);
            }
        }
        None
    }
}

/// A closed local port: bound once, then released.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn read_packet(stream: &mut TcpStream) -> std::io::Result<Option<(u8, Vec<u8>)>> {
    let mut header = [0u8; 1];
    if stream.read_exact(&mut header).await.is_err() {
        return Ok(None);
    }

    let mut len = 0usize;
    let mut multiplier = 1usize;
    loop {
        let mut byte = [0u8; 1];
        stream.read_exact(&mut byte).await?;
        len += (byte[0] & 0x7f) as usize * multiplier;
        if byte[0] & 0x80 == 0 {
            break;
        }
        multiplier *= 128;
    }

    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await?;
    Ok(Some((header[0], body)))
}

fn remaining_length(mut len: usize, out: &mut Vec<u8>) {
    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if len == 0 {
            break;
        }
    }
}

/// A QoS 0 PUBLISH as the broker would send it.
pub fn publish_packet(topic: &str, payload: &[u8]) -> Vec<u8> {
    let mut packet = vec![0x30];
    remaining_length(2 + topic.len() + payload.len(), &mut packet);
    packet.extend_from_slice(&(topic.len() as u16).to_be_bytes());
    packet.extend_from_slice(topic.as_bytes());
    packet.extend_from_slice(payload);
    packet
}

/// Topic and payload of a QoS 0 PUBLISH body.
pub fn parse_publish(body: &[u8]) -> (String, Vec<u8>) {
    let len = u16::from_be_bytes([body[0], body[1]]) as usize;
    let topic = String::from_utf8(body[2..2 + len].to_vec()).unwrap();
    (topic, body[2 + len..].to_vec())
}

/// Topic filters of a SUBSCRIBE body.
pub fn parse_subscribe(body: &[u8]) -> Vec<String> {
    let mut topics = Vec::new();
    let mut at = 2;
    while at + 2 <= body.len() {
        let len = u16::from_be_bytes([body[at], body[at + 1]]) as usize;
        topics.push(String::from_utf8(body[at + 2..at + 2 + len].to_vec()).unwrap());
        at += 2 + len + 1;
    }
    topics
}
