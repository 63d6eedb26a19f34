//! Shared access signature tokens for IoT Hub.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::utils::SinkError;

type HmacSha256 = Hmac<Sha256>;

/// Builds `SharedAccessSignature sr=..&sig=..&se=..[&skn=..]`.
///
/// `key` is the base64 shared access key, `expiry` is seconds since the Unix
/// epoch. The signed string is `<url-encoded resource>\n<expiry>`.
pub fn generate_token(
    resource_uri: &str,
    key: &str,
    policy: Option<&str>,
    expiry: i64,
) -> Result<String, SinkError> {
    let encoded_uri = urlencoding::encode(resource_uri);
    let signature = sign(key, &format!("{encoded_uri}\n{expiry}"))?;

    let mut token = format!(
        "SharedAccessSignature sr={encoded_uri}&sig={}&se={expiry}",
        urlencoding::encode(&signature)
    );
    if let Some(policy) = policy {
        token.push_str("&skn=");
        token.push_str(&urlencoding::encode(policy));
    }

    Ok(token)
}

/// base64(HMAC-SHA256(base64decode(key), message))
pub fn sign(key: &str, message: &str) -> Result<String, SinkError> {
    let key = STANDARD.decode(key)?;
    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|e| SinkError::InvalidKey(e.to_string()))?;
    mac.update(message.as_bytes());

    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
