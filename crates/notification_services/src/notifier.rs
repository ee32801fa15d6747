use std::sync::Arc;

use async_trait::async_trait;
use campground_scan::{AvailabilityMap, CycleLog, Notifier, NotifyError, ScanError};
use chrono::NaiveDate;

use crate::message::{availability_message, failure_message};
use crate::service::EmailService;
use crate::types::{EmailMessage, NotificationError, validate_recipients};

/// Emails one campsite's results: availability to its subscribers,
/// failures to the admin address.
pub struct EmailNotifier {
    campsite: String,
    subscribers: Vec<String>,
    admin: Vec<String>,
    transport: Arc<dyn EmailService>,
}

impl EmailNotifier {
    /// Create a notifier. Without an admin address failure reports go to
    /// the subscribers.
    pub fn new(
        campsite: impl Into<String>,
        subscribers: Vec<String>,
        admin: Option<String>,
        transport: Arc<dyn EmailService>,
    ) -> Result<Self, NotificationError> {
        let campsite = campsite.into();
        if subscribers.is_empty() {
            return Err(NotificationError::NoRecipients(campsite));
        }
        validate_recipients(&subscribers)?;

        let admin = match admin {
            Some(address) => vec![address],
            None => subscribers.clone(),
        };
        validate_recipients(&admin)?;

        Ok(Self {
            campsite,
            subscribers,
            admin,
            transport,
        })
    }

    async fn deliver(
        &self,
        to: &[String],
        subject: String,
        body: String,
        log: &CycleLog,
    ) -> Result<(), NotifyError> {
        let message = EmailMessage {
            to: to.to_vec(),
            subject,
            body,
        };
        log.log(format!("Sending email to {}", message.to.join(",")));
        let id = self.transport.send_email(&message).await?;
        log.log(format!("Email sent, id {}", id));
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send_availability(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        availability: &AvailabilityMap,
        log: &CycleLog,
    ) -> Result<(), NotifyError> {
        log.log("Preparing availability email...");
        let (subject, body) = availability_message(&self.campsite, start, end, availability);
        log.log(body.clone());
        self.deliver(&self.subscribers, subject, body, log).await
    }

    async fn send_failure(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        error: &ScanError,
        log: &CycleLog,
    ) -> Result<(), NotifyError> {
        let (subject, body) = failure_message(&self.campsite, start, end, error, &log.buffer());
        self.deliver(&self.admin, subject, body, log).await
    }
}
