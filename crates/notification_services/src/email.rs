use std::env;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{EmailService, NotificationError};

const DEFAULT_SMTP_HOST: &str = "in-v3.mailjet.com";
const DEFAULT_SMTPS_PORT: u16 = 465;

/// Settings for the SMTPS relay
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// Relay host name
    pub host: String,
    /// Implicit TLS port
    pub port: u16,
    /// Relay user name
    pub username: String,
    /// Relay password
    pub password: String,
    /// `From` address
    pub sender: String,
}

impl SmtpSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, NotificationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NotificationError> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                NotificationError::ConfigError(format!("{} environment variable not set", key))
            })
        };

        let port = match lookup("SMTP_PORT") {
            Some(port) => port.parse().map_err(|_| {
                NotificationError::ConfigError(format!("SMTP_PORT is not a port number: {}", port))
            })?,
            None => DEFAULT_SMTPS_PORT,
        };

        Ok(Self {
            host: lookup("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            port,
            username: required("SMTP_USERNAME")?,
            password: required("SMTP_PASSWORD")?,
            sender: required("SENDER_EMAIL")?,
        })
    }
}

/// Email service sending through an SMTPS relay
pub struct SmtpEmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpEmailService {
    /// Create a new SMTPS email service
    pub fn new(settings: SmtpSettings) -> Result<Self, NotificationError> {
        let sender: Mailbox = settings
            .sender
            .parse()
            .map_err(|_| NotificationError::InvalidEmail(settings.sender.clone()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| NotificationError::Email(format!("Failed to create SMTP relay: {}", e)))?
            .port(settings.port)
            .credentials(Credentials::new(settings.username, settings.password))
            .build();

        info!("SMTPS relay configured at {}:{}", settings.host, settings.port);

        Ok(Self { transport, sender })
    }

    /// Create a service from environment settings
    pub fn from_env() -> Result<Self, NotificationError> {
        Self::new(SmtpSettings::from_env()?)
    }
}

/// Build a plain text message with a fresh message id.
pub fn build_message(
    sender: &Mailbox,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(String, Message), NotificationError> {
    let recipient: Mailbox = to
        .parse()
        .map_err(|_| NotificationError::InvalidEmail(to.to_string()))?;

    let message_id = format!("<{}@campsite-scanner>", Uuid::new_v4());

    let message = Message::builder()
        .from(sender.clone())
        .to(recipient)
        .subject(subject)
        .message_id(Some(message_id.clone()))
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| NotificationError::Email(format!("Failed to build message: {}", e)))?;

    Ok((message_id, message))
}

#[async_trait]
impl EmailService for SmtpEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, NotificationError> {
        info!("Sending email to {} with subject: {}", to, subject);

        let (message_id, message) = build_message(&self.sender, to, subject, body)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| NotificationError::Email(format!("SMTP send failed: {}", e)))?;

        debug!("SMTP relay answered {}", response.code());

        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_settings_defaults() {
        let settings = SmtpSettings::from_lookup(lookup(&[
            ("SMTP_USERNAME", "user"),
            ("SMTP_PASSWORD", "secret"),
            ("SENDER_EMAIL", "alerts@example.com"),
        ]))
        .unwrap();

        assert_eq!(settings.host, "in-v3.mailjet.com");
        assert_eq!(settings.port, 465);
    }

    #[test]
    fn test_settings_missing_credentials() {
        let result = SmtpSettings::from_lookup(lookup(&[("SENDER_EMAIL", "alerts@example.com")]));
        assert!(matches!(result, Err(NotificationError::ConfigError(msg)) if msg.contains("SMTP_USERNAME")));
    }

    #[test]
    fn test_settings_bad_port() {
        let result = SmtpSettings::from_lookup(lookup(&[
            ("SMTP_PORT", "smtps"),
            ("SMTP_USERNAME", "user"),
            ("SMTP_PASSWORD", "secret"),
            ("SENDER_EMAIL", "alerts@example.com"),
        ]));
        assert!(matches!(result, Err(NotificationError::ConfigError(_))));
    }

    #[test]
    fn test_build_message() {
        let sender: Mailbox = "alerts@example.com".parse().unwrap();
        let (message_id, message) =
            build_message(&sender, "camper@example.com", "availability", "found it").unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: availability"));
        assert!(raw.contains("To: camper@example.com"));
        assert!(raw.contains(&message_id));
        assert!(raw.contains("found it"));
    }

    #[test]
    fn test_build_message_invalid_recipient() {
        let sender: Mailbox = "alerts@example.com".parse().unwrap();
        let result = build_message(&sender, "nope", "availability", "body");
        assert!(matches!(result, Err(NotificationError::InvalidEmail(_))));
    }
}
