use std::str::FromStr;

use crate::utils::SinkError;

/// A parsed device connection string:
/// `HostName=<hub>;DeviceId=<id>;SharedAccessKey=<base64>`, optionally with
/// `SharedAccessKeyName=<policy>`.
#[derive(Clone, PartialEq, Eq)]
pub struct IotHubConnectionString {
    pub host_name: String,
    pub device_id: String,
    pub shared_access_key: String,
    pub shared_access_key_name: Option<String>,
}

impl IotHubConnectionString {
    pub fn parse(s: &str) -> Result<Self, SinkError> {
        let mut host_name = None;
        let mut device_id = None;
        let mut shared_access_key = None;
        let mut shared_access_key_name = None;

        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            // keys are base64 and may end in '=', so split on the first one only
            let (key, value) = part.split_once('=').ok_or_else(|| {
                SinkError::ConnectionString(format!("expected Key=Value, got '{part}'"))
            })?;
            let value = value.to_string();
            match key {
                "HostName" => host_name = Some(value),
                "DeviceId" => device_id = Some(value),
                "SharedAccessKey" => shared_access_key = Some(value),
                "SharedAccessKeyName" => shared_access_key_name = Some(value),
                _ => {}
            }
        }

        Ok(Self {
            host_name: required(host_name, "HostName")?,
            device_id: required(device_id, "DeviceId")?,
            shared_access_key: required(shared_access_key, "SharedAccessKey")?,
            shared_access_key_name,
        })
    }

    /// The SAS resource for this device: `<host>/devices/<device id>`.
    pub fn resource_uri(&self) -> String {
        format!(
            "{}/devices/{}",
            self.host_name,
            urlencoding::encode(&self.device_id)
        )
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, SinkError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SinkError::ConnectionString(format!("missing {name}")))
}

impl FromStr for IotHubConnectionString {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// the key never goes to the logs
impl std::fmt::Debug for IotHubConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IotHubConnectionString")
            .field("host_name", &self.host_name)
            .field("device_id", &self.device_id)
            .field("shared_access_key", &"<redacted>")
            .field("shared_access_key_name", &self.shared_access_key_name)
            .finish()
    }
}
