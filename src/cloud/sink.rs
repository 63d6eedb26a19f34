use async_trait::async_trait;

use crate::utils::SinkError;

/// A cloud telemetry endpoint that accepts one text payload per call.
#[async_trait]
pub trait CloudSink: Send + Sync {
    async fn send(&self, payload: &str) -> Result<(), SinkError>;
}
