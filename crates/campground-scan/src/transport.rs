use std::env;
use std::time::Duration;

use reqwest::{Client, Proxy};
use serde::Deserialize;
use tracing::{info, warn};

use crate::scan_types::ScanError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How outbound provider requests reach the internet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProxySource {
    /// Direct connection
    #[default]
    Direct,
    /// Fixed proxy URL
    Fixed(String),
    /// Proxy list endpoint queried once when the client is built
    Discover(String),
}

/// Settings for the HTTP client shared by all provider adapters
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Proxy selection
    pub proxy: ProxySource,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            proxy: ProxySource::Direct,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProxyListResponse {
    #[serde(default)]
    data: Vec<ProxyEntry>,
}

#[derive(Debug, Deserialize)]
struct ProxyEntry {
    #[serde(rename = "ipPort")]
    ip_port: String,
}

impl TransportConfig {
    /// Read `HTTP_PROXY_URL`, `PROXY_DISCOVERY_URL` and `HTTP_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ScanError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ScanError> {
        let proxy = match (lookup("HTTP_PROXY_URL"), lookup("PROXY_DISCOVERY_URL")) {
            (Some(url), _) if !url.trim().is_empty() => ProxySource::Fixed(url),
            (_, Some(url)) if !url.trim().is_empty() => ProxySource::Discover(url),
            _ => ProxySource::Direct,
        };

        let timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(secs.trim().parse().map_err(|_| {
                ScanError::ConfigError(format!("HTTP_TIMEOUT_SECS is not a number: {}", secs))
            })?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self { proxy, timeout })
    }

    /// Build the client, resolving a discovered proxy if configured.
    ///
    /// A failed discovery falls back to a direct connection.
    pub async fn build_client(&self) -> Result<Client, ScanError> {
        let proxy_url = match &self.proxy {
            ProxySource::Direct => None,
            ProxySource::Fixed(url) => Some(url.clone()),
            ProxySource::Discover(url) => {
                let discovery_client = Client::builder().timeout(self.timeout).build()?;
                match discover_proxy(&discovery_client, url).await {
                    Ok(proxy) => Some(proxy),
                    Err(e) => {
                        warn!("Proxy discovery failed, connecting directly: {}", e);
                        None
                    }
                }
            }
        };

        let mut builder = Client::builder().cookie_store(true).timeout(self.timeout);
        if let Some(proxy_url) = proxy_url {
            info!("Routing provider requests through proxy {}", proxy_url);
            builder = builder.proxy(Proxy::all(&proxy_url)?);
        }

        Ok(builder.build()?)
    }
}

/// Ask a proxy list endpoint for one proxy, returned as an `http://host:port` URL
pub async fn discover_proxy(client: &Client, url: &str) -> Result<String, ScanError> {
    let response = client.get(url).send().await?.error_for_status()?;
    let proxies: ProxyListResponse = response.json().await?;

    proxies
        .data
        .into_iter()
        .next()
        .map(|entry| format!("http://{}", entry.ip_port))
        .ok_or_else(|| ScanError::ConfigError("Proxy list endpoint returned no proxy".to_string()))
}
