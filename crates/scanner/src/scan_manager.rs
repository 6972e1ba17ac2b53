use std::env;
use std::sync::Arc;

use anyhow::Result;
use campground_scan::{
    CampsiteQuery, NotificationServiceImpl, ProviderDispatch, ScanExecutor, ScanExecutorConfig,
    TickOutcome, TransportConfig,
};
use notification_services::{
    HttpSmsGateway, SmtpEmailService, SmtpSettings, email_recipients, sms_recipients,
};
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Owns the executor and the tasks polling the configured queries
pub struct ScanManager {
    queries: Vec<CampsiteQuery>,
    executor: Option<Arc<ScanExecutor>>,
    handles: Vec<JoinHandle<()>>,
}

impl ScanManager {
    /// Create a new scan manager
    pub fn new(queries: Vec<CampsiteQuery>) -> Self {
        Self {
            queries,
            executor: None,
            handles: Vec::new(),
        }
    }

    /// Wire transport, providers and notifier from the environment
    async fn executor(&mut self) -> Result<Arc<ScanExecutor>> {
        if let Some(executor) = &self.executor {
            return Ok(executor.clone());
        }

        let executor_config = ScanExecutorConfig::from_env()?;
        let client = TransportConfig::from_env()?.build_client().await?;

        let provider = Arc::new(ProviderDispatch::new(client.clone()));
        let notification_service = Arc::new(notifier_from_lookup(client, |key| {
            env::var(key).ok()
        }));

        let executor = Arc::new(ScanExecutor::new(
            provider,
            notification_service,
            Some(executor_config),
        ));
        self.executor = Some(executor.clone());
        Ok(executor)
    }

    /// Start polling every query until [`ScanManager::stop`] is called
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting scan execution system");

        let executor = self.executor().await?;
        self.handles = executor.start(self.queries.clone());

        info!("Scan execution system started with {} jobs", self.queries.len());
        Ok(())
    }

    /// Check every query a single time
    pub async fn run_once(&mut self) -> Result<Vec<TickOutcome>> {
        let executor = self.executor().await?;
        Ok(executor.run_once(&self.queries).await)
    }

    /// Stop every polling task
    pub async fn stop(&mut self) {
        info!("Stopping scan execution system");

        for handle in self.handles.drain(..) {
            handle.abort();
            let _ = handle.await;
        }

        self.executor = None;

        info!("Scan execution system stopped");
    }
}

impl Drop for ScanManager {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

/// Build the notifier, enabling each channel whose settings are complete
fn notifier_from_lookup(
    client: Client,
    lookup: impl Fn(&str) -> Option<String>,
) -> NotificationServiceImpl {
    let mut notifier = NotificationServiceImpl::new();

    let email_list = lookup("RECEIVER_EMAILS").unwrap_or_default();
    let email = SmtpSettings::from_lookup(&lookup)
        .and_then(SmtpEmailService::new)
        .and_then(|service| Ok((service, email_recipients(&email_list)?)));
    match email {
        Ok((_, recipients)) if recipients.is_empty() => {
            warn!("RECEIVER_EMAILS is empty, email alerts disabled")
        }
        Ok((service, recipients)) => {
            info!("Email alerts enabled for {} recipient(s)", recipients.len());
            notifier = notifier.with_email(Arc::new(service), recipients);
        }
        Err(e) => warn!("Email alerts disabled: {}", e),
    }

    let sms_list = lookup("RECEIVER_SMS").unwrap_or_default();
    let sms = HttpSmsGateway::from_lookup(client, &lookup)
        .and_then(|gateway| Ok((gateway, sms_recipients(&sms_list)?)));
    match sms {
        Ok((_, recipients)) if recipients.is_empty() => {
            warn!("RECEIVER_SMS is empty, SMS alerts disabled")
        }
        Ok((gateway, recipients)) => {
            info!("SMS alerts enabled for {} recipient(s)", recipients.len());
            notifier = notifier.with_sms(Arc::new(gateway), recipients);
        }
        Err(e) => warn!("SMS alerts disabled: {}", e),
    }

    if !notifier.has_channels() {
        warn!("No notification channel enabled, availability will only be logged");
    }

    notifier
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[tokio::test]
    async fn test_no_settings_disables_every_channel() {
        let notifier = notifier_from_lookup(Client::new(), lookup_from(&[]));
        assert!(!notifier.has_channels());
    }

    #[tokio::test]
    async fn test_sms_channel_from_gateway_and_recipients() {
        let notifier = notifier_from_lookup(
            Client::new(),
            lookup_from(&[
                ("BLOWERIO_URL", "https://gateway.example.com"),
                ("RECEIVER_SMS", "['+14155550100']"),
            ]),
        );
        assert!(notifier.has_channels());
    }

    #[tokio::test]
    async fn test_email_channel_from_smtp_settings() {
        let notifier = notifier_from_lookup(
            Client::new(),
            lookup_from(&[
                ("SMTP_USERNAME", "user"),
                ("SMTP_PASSWORD", "secret"),
                ("SENDER_EMAIL", "alerts@example.com"),
                ("RECEIVER_EMAILS", "['a@example.com', \"b@example.com\"]"),
            ]),
        );
        assert!(notifier.has_channels());
    }

    #[tokio::test]
    async fn test_invalid_recipients_disable_channel() {
        let notifier = notifier_from_lookup(
            Client::new(),
            lookup_from(&[
                ("SMS_GATEWAY_URL", "https://gateway.example.com"),
                ("RECEIVER_SMS", "['not a phone']"),
            ]),
        );
        assert!(!notifier.has_channels());
    }

    #[tokio::test]
    async fn test_run_once_without_queries() {
        let mut manager = ScanManager::new(Vec::new());
        let outcomes = manager.run_once().await.unwrap();
        assert!(outcomes.is_empty());
        manager.stop().await;
    }
}
