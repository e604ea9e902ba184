//! Outbound email for the portfolio service.
//!
//! [`Notifier`] turns account and portfolio events into rendered emails and hands them to a
//! [`Mailer`] backend. Every send returns a [`Result`]; delivery problems are reported to
//! the caller and never retried.

pub mod mailer;
pub mod notifier;
pub mod templates;

use thiserror::Error;

pub use mailer::{ConsoleMailer, Email, Mailer, MemoryMailer, SmtpMailer, SmtpSettings};
pub use notifier::Notifier;
pub use templates::Templates;

/// Error types for email delivery
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Invalid email address: {0}")]
    Address(String),

    /// The message could not be assembled
    #[error("Message build error: {0}")]
    Build(String),

    /// The backend refused or failed to deliver
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

pub type Result<T> = std::result::Result<T, NotifyError>;
