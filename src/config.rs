use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use domain::tokens::TokenIssuer;
use notify::{ConsoleMailer, Mailer, Notifier, SmtpMailer, SmtpSettings, Templates};
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::schemas::AppState;

const DEFAULT_JWT_SECRET: &str = "insecure-development-secret";

/// Service configuration.
///
/// Layered from built-in defaults, an optional `portfy.toml` and `PORTFY__*` environment
/// variables (`PORTFY__JWT__SECRET`, `PORTFY__EMAIL__SMTP_HOST`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// Base URL of the web frontend; used for links in emails.
    pub frontend_url: String,
    /// Directory served under `/media`.
    pub media_root: String,
    pub jwt: JwtSettings,
    pub email: EmailSettings,
}

#[derive(Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("access_token_minutes", &self.access_token_minutes)
            .field("refresh_token_days", &self.refresh_token_days)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailBackend {
    Smtp,
    /// Log emails instead of sending them
    Console,
}

#[derive(Clone, Deserialize)]
pub struct EmailSettings {
    pub backend: EmailBackend,
    pub smtp_host: String,
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
    pub starttls: bool,
    pub from_email: String,
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("backend", &self.backend)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("starttls", &self.starttls)
            .field("from_email", &self.from_email)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Loads `.env`, then builds the layered configuration.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: Settings = Config::builder()
            .set_default("database_url", "sqlite://portfy.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:8000")?
            .set_default("frontend_url", "http://localhost:3000")?
            .set_default("media_root", "media")?
            .set_default("jwt.secret", DEFAULT_JWT_SECRET)?
            .set_default("jwt.access_token_minutes", 60)?
            .set_default("jwt.refresh_token_days", 1)?
            .set_default("email.backend", "console")?
            .set_default("email.smtp_host", "localhost")?
            .set_default("email.smtp_port", 587)?
            .set_default("email.starttls", true)?
            .set_default("email.from_email", "Portfy <noreply@portfy.local>")?
            .add_source(File::with_name("portfy").required(false))
            .add_source(
                Environment::with_prefix("PORTFY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        if settings.jwt.secret == DEFAULT_JWT_SECRET {
            warn!("PORTFY__JWT__SECRET is not set; using the development signing key");
        }

        Ok(settings)
    }

    /// Command-line values win over every configuration layer.
    pub fn apply_overrides(&mut self, database_url: Option<String>, bind_address: Option<String>) {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
    }
}

/// Builds the mail backend selected by `settings.email.backend`.
pub fn build_mailer(settings: &EmailSettings) -> Result<Arc<dyn Mailer>> {
    match settings.backend {
        EmailBackend::Smtp => {
            debug!("Using SMTP relay {}:{}", settings.smtp_host, settings.smtp_port);
            let mailer = SmtpMailer::new(&SmtpSettings {
                host: settings.smtp_host.clone(),
                port: settings.smtp_port,
                username: settings.smtp_username.clone(),
                password: settings.smtp_password.clone(),
                starttls: settings.starttls,
            })
            .context("Failed to configure SMTP transport")?;
            Ok(Arc::new(mailer))
        }
        EmailBackend::Console => {
            debug!("Using console email backend");
            Ok(Arc::new(ConsoleMailer))
        }
    }
}

/// Assembles everything but the database connection.
pub fn build_app_state(
    db: sea_orm::DatabaseConnection,
    settings: Settings,
    mailer: Arc<dyn Mailer>,
) -> Result<AppState> {
    let tokens = TokenIssuer::new(
        settings.jwt.secret.as_bytes(),
        chrono::Duration::minutes(settings.jwt.access_token_minutes),
        chrono::Duration::days(settings.jwt.refresh_token_days),
    );
    let templates = Templates::builtin().context("Failed to compile email templates")?;
    let notifier = Notifier::new(
        mailer,
        templates,
        settings.email.from_email.clone(),
        settings.frontend_url.clone(),
    );

    Ok(AppState {
        db,
        tokens: Arc::new(tokens),
        notifier,
        settings: Arc::new(settings),
    })
}

/// Initialize application state against a specific database
pub async fn initialize_app_state_with_url(
    settings: Settings,
    database_url: &str,
) -> Result<AppState> {
    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    let mailer = build_mailer(&settings.email)?;
    build_app_state(db, settings, mailer)
}
