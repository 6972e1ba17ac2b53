//! # Notification Services
//!
//! Outbound transports used to deliver availability alerts: an SMTPS email
//! relay and an HTTP SMS gateway, plus parsing of the recipient lists both
//! read from the environment.

/// SMTPS email transport.
pub mod email;
/// Recipient list parsing and validation.
pub mod recipients;
/// HTTP SMS gateway transport.
pub mod sms;
/// Transport traits and errors.
pub mod types;

pub use email::{SmtpEmailService, SmtpSettings};
pub use recipients::{email_recipients, parse_recipient_list, sms_recipients};
pub use sms::HttpSmsGateway;
pub use types::{EmailService, NotificationError, SmsService};
