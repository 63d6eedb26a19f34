//! Error types for the relay.
//!
//! `RelayError` covers the broker side and startup; `SinkError` covers the
//! cloud forwarding path, which the relay logs and swallows.

use std::str::Utf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("payload on topic '{topic}' is not valid UTF-8: {source}")]
    Decode {
        topic: String,
        #[source]
        source: Utf8Error,
    },

    #[error("mqtt client request failed: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("mqtt connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("cloud sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("relay worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("timed out after {0}s")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid connection string: {0}")]
    ConnectionString(String),

    #[error("invalid shared access key: {0}")]
    InvalidKey(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("iot hub rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<base64::DecodeError> for SinkError {
    fn from(err: base64::DecodeError) -> Self {
        SinkError::InvalidKey(err.to_string())
    }
}
