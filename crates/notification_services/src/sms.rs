use std::env;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::types::{NotificationError, SmsService};

/// SMS service posting to an HTTP gateway (`POST {base}/messages`)
pub struct HttpSmsGateway {
    client: Client,
    base_url: String,
}

impl HttpSmsGateway {
    /// Create a gateway client for `base_url`
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Create a gateway client from `SMS_GATEWAY_URL` (or `BLOWERIO_URL`)
    pub fn from_env(client: Client) -> Result<Self, NotificationError> {
        Self::from_lookup(client, |key| env::var(key).ok())
    }

    /// Create a gateway client through an arbitrary key lookup
    pub fn from_lookup(
        client: Client,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, NotificationError> {
        let base_url = lookup("SMS_GATEWAY_URL")
            .or_else(|| lookup("BLOWERIO_URL"))
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                NotificationError::ConfigError(
                    "SMS_GATEWAY_URL environment variable not set".to_string(),
                )
            })?;

        Ok(Self::new(client, base_url))
    }
}

#[async_trait]
impl SmsService for HttpSmsGateway {
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError> {
        info!("Sending SMS to {}", to);

        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[("to", to), ("message", message)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!("SMS gateway returned {}: {}", status, body);
            return Err(NotificationError::Sms(format!("HTTP {} - {}", status, body)));
        }

        debug!("SMS gateway response: {}", body);

        let message_id = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.get("id").map(|id| id.to_string().trim_matches('"').to_string()))
            .unwrap_or_else(|| format!("sms-{}", Uuid::new_v4()));

        Ok(message_id)
    }
}
