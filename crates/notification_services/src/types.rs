use async_trait::async_trait;

/// Errors raised by the notification transports.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// SMTP relay or message construction errors.
    #[error("Email error: {0}")]
    Email(String),

    /// SMS gateway errors.
    #[error("SMS error: {0}")]
    Sms(String),

    /// HTTP transport errors.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid phone number format.
    #[error("Invalid phone number format: {0}")]
    InvalidPhoneNumber(String),

    /// Invalid email format.
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// Missing or malformed transport settings.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Trait for email service implementations
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Send a plain text email, returning the message id.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, NotificationError>;
}

/// Trait for SMS service implementations
#[async_trait]
pub trait SmsService: Send + Sync {
    /// Send a text message, returning the gateway's message id.
    async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError>;
}
