use std::sync::Arc;

use chrono::{Datelike, Utc};
use domain::publish::PublishEvent;
use model::entities::{contact_message, user};
use tera::Context;
use tracing::{debug, warn};

use crate::mailer::{Email, Mailer};
use crate::templates::Templates;
use crate::Result;

/// Renders and sends every email the service produces.
#[derive(Debug, Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    templates: Templates,
    from_email: String,
    frontend_url: String,
}

impl Notifier {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        templates: Templates,
        from_email: impl Into<String>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            templates,
            from_email: from_email.into(),
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn frontend_url(&self) -> &str {
        &self.frontend_url
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.frontend_url)
    }

    fn base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("current_year", &Utc::now().year());
        context
    }

    /// Renders `<template>.html` and `<template>.txt` into one email.
    fn compose(&self, to: &str, subject: &str, template: &str, context: &Context) -> Result<Email> {
        let html = self
            .templates
            .render(&format!("{}.html", template), context)?;
        let text = self.templates.render(&format!("{}.txt", template), context)?;

        Ok(Email {
            from: self.from_email.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            text,
            html: Some(html),
        })
    }

    async fn deliver(&self, email: Email) -> Result<()> {
        debug!(to = %email.to, subject = %email.subject, "Sending email");
        self.mailer.send(&email).await
    }

    pub async fn send_verification(&self, user: &user::Model, token: &str) -> Result<()> {
        let mut context = self.base_context();
        context.insert("username", &user.username);
        context.insert(
            "verification_url",
            &format!("{}/verify-email/{}", self.frontend_url, token),
        );

        let email = self.compose(
            &user.email,
            "Verify Your Email - Portfy",
            "email/verification",
            &context,
        )?;
        self.deliver(email).await
    }

    pub async fn send_password_reset(&self, user: &user::Model, token: &str) -> Result<()> {
        let mut context = self.base_context();
        context.insert("username", &user.username);
        context.insert(
            "reset_url",
            &format!("{}/reset-password/{}", self.frontend_url, token),
        );

        let email = self.compose(
            &user.email,
            "Password Reset - Portfy",
            "email/password_reset",
            &context,
        )?;
        self.deliver(email).await
    }

    pub async fn send_approval(&self, user: &user::Model, approved: bool) -> Result<()> {
        let mut context = self.base_context();
        context.insert("username", &user.username);
        context.insert("login_url", &self.login_url());

        let (subject, template) = if approved {
            ("Your Portfy Account Has Been Approved!", "email/account_approved")
        } else {
            ("Portfy Account Review Update", "email/account_rejected")
        };

        let email = self.compose(&user.email, subject, template, &context)?;
        self.deliver(email).await
    }

    /// Tells the owner their portfolio went live or was taken down.
    pub async fn send_portfolio_status(
        &self,
        user: &user::Model,
        slug: Option<&str>,
        event: PublishEvent,
    ) -> Result<()> {
        let dashboard_url = format!("{}/dashboard", self.frontend_url);
        let mut context = self.base_context();
        context.insert("username", &user.username);

        let (subject, template) = match event {
            PublishEvent::Published => {
                let portfolio_url = match slug {
                    Some(slug) => format!("{}/{}", self.frontend_url, slug),
                    None => dashboard_url,
                };
                context.insert("portfolio_url", &portfolio_url);
                ("Your Portfolio is Now Live! - Portfy", "email/portfolio_published")
            }
            PublishEvent::Unpublished { by_admin } => {
                context.insert("dashboard_url", &dashboard_url);
                context.insert("unpublished_by_admin", &by_admin);
                (
                    "Your Portfolio Has Been Unpublished - Portfy",
                    "email/portfolio_unpublished",
                )
            }
        };

        let email = self.compose(&user.email, subject, template, &context)?;
        self.deliver(email).await
    }

    /// Emails a stored reply to the person who wrote the message.
    ///
    /// The plain-text body never depends on templates; if the HTML part cannot be rendered
    /// the email goes out as text only.
    pub async fn send_contact_reply(&self, message: &contact_message::Model) -> Result<()> {
        let reply = message.reply.as_deref().unwrap_or_default();

        let mut context = self.base_context();
        context.insert("name", &message.name);
        context.insert("original_message", &message.message);
        context.insert("reply", reply);

        let html = match self.templates.render("email/contact_reply.html", &context) {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("Contact reply template failed, sending plain text: {}", e);
                None
            }
        };

        let email = Email {
            from: self.from_email.clone(),
            to: message.email.clone(),
            subject: "Re: Your message - Portfy".to_string(),
            text: contact_reply_text(&message.name, &message.message, reply),
            html,
        };
        self.deliver(email).await
    }

    /// Browser-facing result page for verification links.
    pub fn render_verification_page(
        &self,
        success: bool,
        message: &str,
        suggestion: Option<&str>,
    ) -> Result<String> {
        let mut context = self.base_context();
        context.insert("success", &success);
        context.insert("message", message);
        context.insert("suggestion", &suggestion);
        context.insert("login_url", &self.login_url());
        self.templates
            .render("pages/verification_result.html", &context)
    }
}

fn contact_reply_text(name: &str, original: &str, reply: &str) -> String {
    format!(
        "Hello {name},\n\nThank you for contacting us. Here is our reply to your message:\n\n---\nOriginal Message:\n{original}\n---\n\nOur Reply:\n{reply}\n\n---\nBest regards,\nPortfy Team"
    )
}
