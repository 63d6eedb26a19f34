use crate::utils::RelayError;

/// An inbound broker message with its payload decoded as UTF-8.
///
/// Lives only for the duration of one `on_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: String,
}

impl Message {
    /// Decodes `payload`; non-UTF-8 bytes are a `RelayError::Decode`.
    pub fn decode(topic: &str, payload: &[u8]) -> Result<Self, RelayError> {
        let text = std::str::from_utf8(payload).map_err(|source| RelayError::Decode {
            topic: topic.to_string(),
            source,
        })?;

        Ok(Self {
            topic: topic.to_string(),
            payload: text.to_string(),
        })
    }

    /// The topic the acknowledgment for this message goes to.
    pub fn ack_topic(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.topic)
    }
}
