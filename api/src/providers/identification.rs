use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use cropchat_core::error::ProviderError;

use crate::config::ProviderConfig;
use crate::providers::error_detail;

/// Client for the remote crop classifier. One blocking round trip per call,
/// no timeout, no retry; a failed call surfaces as a `ProviderError` the
/// chat handler turns into a user-visible reply.
#[derive(Clone)]
pub struct IdentificationClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl IdentificationClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.identification_url.clone(),
            api_key: config.identification_api_key.clone(),
        }
    }

    /// Send image bytes to the classifier and return its raw JSON payload,
    /// whatever its shape. Normalization happens downstream.
    pub async fn analyze(&self, image_bytes: &[u8]) -> Result<serde_json::Value, ProviderError> {
        let encoded = BASE64.encode(image_bytes);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "image": encoded }))
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Http {
                status: status.as_u16(),
                detail: error_detail(detail),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|err| ProviderError::MalformedResponse(err.to_string()))
    }
}
