use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ses::Client as SesClient;
use aws_sdk_ses::types::{Body, Content, Destination, Message};

use crate::types::{EmailMessage, NotificationError};

/// Something that can deliver a plain-text email
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Send a message, returning the transport's message id
    async fn send_email(&self, message: &EmailMessage) -> Result<String, NotificationError>;
}

/// Email delivery through AWS SES.
#[derive(Debug, Clone)]
pub struct SesEmailService {
    ses_client: SesClient,
    from_email: String,
}

impl SesEmailService {
    /// Creates a new instance with the AWS client loaded from the environment.
    pub async fn new(from_email: impl Into<String>) -> Result<Self, NotificationError> {
        let from_email = from_email.into();
        crate::types::validate_recipients(std::slice::from_ref(&from_email))?;

        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        Ok(Self {
            ses_client: SesClient::new(&config),
            from_email,
        })
    }

    fn content(data: &str, part: &str) -> Result<Content, NotificationError> {
        Content::builder().data(data).build().map_err(|e| {
            log::error!("❌ Failed to build {} content: {}", part, e);
            NotificationError::SesError(format!("Failed to build {}: {}", part, e))
        })
    }
}

#[async_trait]
impl EmailService for SesEmailService {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, NotificationError> {
        if message.to.is_empty() {
            return Err(NotificationError::NoRecipients(message.subject.clone()));
        }

        let body = Body::builder()
            .text(Self::content(&message.body, "text body")?)
            .build();

        let ses_message = Message::builder()
            .subject(Self::content(&message.subject, "subject")?)
            .body(body)
            .build();

        let destination = Destination::builder()
            .set_to_addresses(Some(message.to.clone()))
            .build();

        log::info!("📧 Sending '{}' via AWS SES...", message.subject);

        let result = self
            .ses_client
            .send_email()
            .source(&self.from_email)
            .destination(destination)
            .message(ses_message)
            .send()
            .await;

        match result {
            Ok(output) => {
                let message_id = output.message_id().to_string();
                log::info!(
                    "✅ Email sent to {}, SES Message ID: {}",
                    message.to.join(","),
                    message_id
                );
                Ok(message_id)
            }
            Err(e) => {
                log::error!("❌ AWS SES error: {:#?}", e);
                let error_msg = if let Some(service_error) = e.as_service_error() {
                    format!("AWS SES service error: {:?}", service_error)
                } else {
                    format!("AWS SES error: {}", e)
                };
                Err(NotificationError::SesError(error_msg))
            }
        }
    }
}

/// Writes emails to the log instead of sending them, for dry runs.
#[derive(Debug, Clone, Default)]
pub struct LogEmailService;

#[async_trait]
impl EmailService for LogEmailService {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, NotificationError> {
        if message.to.is_empty() {
            return Err(NotificationError::NoRecipients(message.subject.clone()));
        }

        log::info!(
            "Email content:\nTo: {}\nSubject: {}\nBody: {}",
            message.to.join(","),
            message.subject,
            message.body
        );
        Ok(format!(
            "dry-run-{}",
            chrono::Utc::now().timestamp_millis()
        ))
    }
}
