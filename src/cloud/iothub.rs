use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::cloud::{CloudSink, IotHubConnectionString, sas};
use crate::config::CloudSettings;
use crate::utils::SinkError;

/// Sends device-to-cloud messages to IoT Hub over HTTPS.
///
/// One POST per payload, signed with a fresh SAS token. No retries.
pub struct IotHubSink {
    http: reqwest::Client,
    connection: IotHubConnectionString,
    url: String,
    token_ttl_secs: i64,
}

impl IotHubSink {
    pub fn new(
        connection: IotHubConnectionString,
        endpoint: Option<&str>,
        api_version: &str,
        token_ttl_secs: u64,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        let base = endpoint
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("https://{}", connection.host_name));
        let url = format!(
            "{base}/devices/{}/messages/events?api-version={api_version}",
            urlencoding::encode(&connection.device_id)
        );

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            connection,
            url,
            token_ttl_secs: i64::try_from(token_ttl_secs).unwrap_or(i64::MAX / 2),
        })
    }

    /// Builds the sink from settings, or `None` when forwarding is off.
    pub fn from_settings(settings: &CloudSettings) -> Result<Option<Self>, SinkError> {
        if !settings.forwarding_enabled() {
            return Ok(None);
        }
        let Some(raw) = settings.connection_string.as_deref() else {
            return Ok(None);
        };

        let connection = IotHubConnectionString::parse(raw)?;
        let sink = Self::new(
            connection,
            settings.endpoint.as_deref(),
            &settings.api_version,
            settings.token_ttl_secs,
            Duration::from_secs(settings.timeout_secs),
        )?;
        Ok(Some(sink))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn token(&self) -> Result<String, SinkError> {
        let expiry = chrono::Utc::now().timestamp() + self.token_ttl_secs;
        sas::generate_token(
            &self.connection.resource_uri(),
            &self.connection.shared_access_key,
            self.connection.shared_access_key_name.as_deref(),
            expiry,
        )
    }
}

#[async_trait]
impl CloudSink for IotHubSink {
    async fn send(&self, payload: &str) -> Result<(), SinkError> {
        let response = self
            .http
            .post(&self.url)
            .header(AUTHORIZATION, self.token()?)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(payload.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "iot hub accepted message");
        Ok(())
    }
}
