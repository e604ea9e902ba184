use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::{NotifyError, Result};

/// A fully rendered outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// A delivery backend.
#[async_trait]
pub trait Mailer: Send + Sync + fmt::Debug {
    async fn send(&self, email: &Email) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Upgrade the connection with STARTTLS. Disable only for local catch-all servers.
    pub starttls: bool,
}

/// Sends through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self> {
        let builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|e| NotifyError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };

        let mut builder = builder.port(settings.port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            host: settings.host.clone(),
        })
    }
}

fn build_message(email: &Email) -> Result<Message> {
    let from: Mailbox = email
        .from
        .parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::Address(e.to_string()))?;
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::Address(e.to_string()))?;

    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject.clone());

    let message = match &email.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            email.text.clone(),
            html.clone(),
        )),
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(email.text.clone()),
    };

    message.map_err(|e| NotifyError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        let message = build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        debug!("SMTP relay {} accepted '{}'", self.host, email.subject);
        Ok(())
    }
}

/// Writes emails to the log instead of sending them. For local development.
#[derive(Debug, Default, Clone)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        build_message(email)?;
        info!(to = %email.to, subject = %email.subject, "Email (console backend)");
        debug!("{}", email.text);
        Ok(())
    }
}

/// Keeps sent emails in memory so tests can inspect them.
#[derive(Debug, Default, Clone)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<Email>>>,
    failing: bool,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        if self.failing {
            return Err(NotifyError::Transport("memory mailer set to fail".to_string()));
        }
        build_message(email)?;
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> Email {
        Email {
            from: "Portfy <noreply@portfy.test>".to_string(),
            to: to.to_string(),
            subject: "Hello".to_string(),
            text: "Plain".to_string(),
            html: Some("<p>Plain</p>".to_string()),
        }
    }

    #[tokio::test]
    async fn test_memory_mailer_records() {
        let mailer = MemoryMailer::new();
        mailer.send(&email("alice@example.com")).await.unwrap();
        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(mailer.sent()[0].to, "alice@example.com");

        mailer.clear();
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected() {
        let mailer = MemoryMailer::new();
        let result = mailer.send(&email("not an address")).await;
        assert!(matches!(result, Err(NotifyError::Address(_))));
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failing_mailer() {
        let mailer = MemoryMailer::failing();
        assert!(matches!(
            mailer.send(&email("alice@example.com")).await,
            Err(NotifyError::Transport(_))
        ));
    }

    #[test]
    fn test_text_only_message_builds() {
        let mut plain = email("bob@example.com");
        plain.html = None;
        assert!(build_message(&plain).is_ok());
    }
}
