use campground_scan::NotifyError;

/// Errors raised while building or delivering notification emails.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// Simple email service (SES) errors.
    #[error("AWS SES error: {0}")]
    SesError(String),

    /// Invalid email format.
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    /// A message with nobody to send it to.
    #[error("No recipients for: {0}")]
    NoRecipients(String),
}

impl From<NotificationError> for NotifyError {
    fn from(e: NotificationError) -> Self {
        NotifyError(e.to_string())
    }
}

/// A plain-text email ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient addresses
    pub to: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Check that every address looks like an email.
pub fn validate_recipients(addresses: &[String]) -> Result<(), NotificationError> {
    use validator::ValidateEmail;

    match addresses.iter().find(|address| !address.validate_email()) {
        Some(bad) => Err(NotificationError::InvalidEmail(bad.clone())),
        None => Ok(()),
    }
}
