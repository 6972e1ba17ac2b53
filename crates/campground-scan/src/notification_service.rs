use std::sync::Arc;

use async_trait::async_trait;
use notification_services::{EmailService, NotificationError, SmsService};
use tracing::{error, info, warn};

use crate::scan_types::{CampsiteQuery, START_DATE_FORMAT};

/// Subject line of availability emails
pub const EMAIL_SUBJECT: &str = "availability";

/// Trait for notification services (SMS, Email)
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Alert every recipient that `query` met its requirement
    async fn send_availability_notification(
        &self,
        query: &CampsiteQuery,
    ) -> Result<(), NotificationError>;
}

/// Implementation of notification service that supports email and SMS
#[derive(Default)]
pub struct NotificationServiceImpl {
    email_service: Option<Arc<dyn EmailService>>,
    email_recipients: Vec<String>,
    sms_service: Option<Arc<dyn SmsService>>,
    sms_recipients: Vec<String>,
}

impl NotificationServiceImpl {
    /// A notifier with no channel; alerts are only logged
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver alerts by email to `recipients`
    pub fn with_email(mut self, service: Arc<dyn EmailService>, recipients: Vec<String>) -> Self {
        self.email_service = Some(service);
        self.email_recipients = recipients;
        self
    }

    /// Deliver alerts by SMS to `recipients`
    pub fn with_sms(mut self, service: Arc<dyn SmsService>, recipients: Vec<String>) -> Self {
        self.sms_service = Some(service);
        self.sms_recipients = recipients;
        self
    }

    /// Whether at least one channel has recipients
    pub fn has_channels(&self) -> bool {
        (self.email_service.is_some() && !self.email_recipients.is_empty())
            || (self.sms_service.is_some() && !self.sms_recipients.is_empty())
    }
}

/// Alert text for a query that met its requirement
pub fn create_notification_content(query: &CampsiteQuery) -> String {
    let mut message = format!(
        "found availability on {} for {} starting {} for {} night(s).",
        query.source.label(),
        query.name,
        query.start_date.format(START_DATE_FORMAT),
        query.consecutive_nights_required
    );

    if let Some(url) = query.source.booking_url() {
        let kind = if query.source.number_of_permits().is_some() {
            "permit"
        } else {
            "campsite"
        };
        message.push_str(&format!(" Book {} at {}.", kind, url));
    }

    message
}

#[async_trait]
impl NotificationService for NotificationServiceImpl {
    async fn send_availability_notification(
        &self,
        query: &CampsiteQuery,
    ) -> Result<(), NotificationError> {
        let message = create_notification_content(query);
        info!("messaging users {}", message);

        if !self.has_channels() {
            warn!("No notification channel configured, alert only logged");
            return Ok(());
        }

        let mut first_error = None;

        if let Some(email_service) = &self.email_service {
            for recipient in &self.email_recipients {
                match email_service
                    .send_email(recipient, EMAIL_SUBJECT, &message)
                    .await
                {
                    Ok(external_id) => info!("Email sent to {} ({})", recipient, external_id),
                    Err(e) => {
                        error!("Failed to send email to {}: {}", recipient, e);
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }
        }

        if let Some(sms_service) = &self.sms_service {
            for recipient in &self.sms_recipients {
                match sms_service.send_sms(recipient, &message).await {
                    Ok(external_id) => info!("SMS sent to {} ({})", recipient, external_id),
                    Err(e) => {
                        error!("Failed to send SMS to {}: {}", recipient, e);
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;

    use super::*;
    use crate::scan_types::Source;

    #[derive(Default)]
    struct MockEmailService {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl EmailService for MockEmailService {
        async fn send_email(
            &self,
            to: &str,
            subject: &str,
            body: &str,
        ) -> Result<String, NotificationError> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), subject.to_string(), body.to_string()));
            if to.starts_with("bounce") {
                return Err(NotificationError::Email("mailbox unavailable".to_string()));
            }
            Ok("mock-email-id".to_string())
        }
    }

    #[derive(Default)]
    struct MockSmsService {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SmsService for MockSmsService {
        async fn send_sms(&self, to: &str, message: &str) -> Result<String, NotificationError> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), message.to_string()));
            Ok("mock-sms-id".to_string())
        }
    }

    fn campground_query() -> CampsiteQuery {
        CampsiteQuery {
            name: "Upper Pines".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            number_of_nights: 4,
            consecutive_nights_required: 2,
            source: Source::RecreationGovCampground {
                facility_id: "232447".to_string(),
            },
        }
    }

    #[test]
    fn test_campground_message_links_booking_page() {
        assert_eq!(
            create_notification_content(&campground_query()),
            "found availability on recreation_gov for Upper Pines starting 07-01-2024 for 2 night(s). \
             Book campsite at https://www.recreation.gov/camping/campgrounds/232447."
        );
    }

    #[test]
    fn test_state_park_message_has_no_link() {
        let query = CampsiteQuery {
            source: Source::ReserveCalifornia {
                facility_id: "690".to_string(),
            },
            ..campground_query()
        };
        assert_eq!(
            create_notification_content(&query),
            "found availability on reserve_california for Upper Pines starting 07-01-2024 for 2 night(s)."
        );
    }

    #[test]
    fn test_message_echoes_configured_platform_name() {
        let query = CampsiteQuery {
            source: Source::ReserveAmerica {
                facility_id: "232447".to_string(),
            },
            ..campground_query()
        };
        assert_eq!(
            create_notification_content(&query),
            "found availability on reserve_america for Upper Pines starting 07-01-2024 for 2 night(s). \
             Book campsite at https://www.recreation.gov/camping/campgrounds/232447."
        );
    }

    #[tokio::test]
    async fn test_sends_to_every_recipient_on_every_channel() {
        let email = Arc::new(MockEmailService::default());
        let sms = Arc::new(MockSmsService::default());
        let service = NotificationServiceImpl::new()
            .with_email(
                email.clone(),
                vec!["a@example.com".to_string(), "b@example.com".to_string()],
            )
            .with_sms(sms.clone(), vec!["+14155550100".to_string()]);

        service
            .send_availability_notification(&campground_query())
            .await
            .unwrap();

        let emails = email.sent.lock().unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0].1, EMAIL_SUBJECT);
        assert_eq!(sms.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_reported_after_trying_everyone() {
        let email = Arc::new(MockEmailService::default());
        let sms = Arc::new(MockSmsService::default());
        let service = NotificationServiceImpl::new()
            .with_email(
                email.clone(),
                vec!["bounce@example.com".to_string(), "ok@example.com".to_string()],
            )
            .with_sms(sms.clone(), vec!["+14155550100".to_string()]);

        let result = service
            .send_availability_notification(&campground_query())
            .await;

        assert!(matches!(result, Err(NotificationError::Email(_))));
        assert_eq!(email.sent.lock().unwrap().len(), 2);
        assert_eq!(sms.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_without_channels_only_logs() {
        let service = NotificationServiceImpl::new();
        assert!(!service.has_channels());
        assert!(
            service
                .send_availability_notification(&campground_query())
                .await
                .is_ok()
        );
    }
}
