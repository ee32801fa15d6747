//! # Notification Services
//!
//! This crate turns availability finder results into emails.
//! It formats availability and failure messages and delivers them through
//! AWS SES, or only logs them for dry runs.

/// Subject and body formatting
pub mod message;
/// Campsite notifier built on an email transport
pub mod notifier;
/// Email transports
pub mod service;
/// Errors and message types
pub mod types;

pub use notifier::EmailNotifier;
pub use service::{EmailService, LogEmailService, SesEmailService};
pub use types::{EmailMessage, NotificationError};
