//! Fixtures for the HTTP-level tests: an in-memory database, an app state whose emails
//! land in a [`MemoryMailer`], seeded accounts and bearer tokens.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, header};
use domain::accounts::{self, NewAccount};
use domain::tokens::TokenKind;
use migration::{Migrator, MigratorTrait};
use model::entities::user;
use notify::MemoryMailer;
use sea_orm::{Database, DatabaseConnection};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::{EmailBackend, EmailSettings, JwtSettings, Settings, build_app_state};
use crate::router::create_router;
use crate::schemas::AppState;

pub const PASSWORD: &str = "correct-horse-battery";

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub fn test_settings() -> Settings {
    Settings {
        database_url: "sqlite::memory:".to_string(),
        bind_address: "127.0.0.1:0".to_string(),
        frontend_url: "http://frontend.test".to_string(),
        media_root: "media".to_string(),
        jwt: JwtSettings {
            secret: "test-signing-key".to_string(),
            access_token_minutes: 60,
            refresh_token_days: 1,
        },
        email: EmailSettings {
            backend: EmailBackend::Console,
            smtp_host: "localhost".to_string(),
            smtp_port: 25,
            smtp_username: None,
            smtp_password: None,
            starttls: false,
            from_email: "Portfy <noreply@portfy.test>".to_string(),
        },
    }
}

/// Everything a test needs to drive the API and inspect its side effects.
pub struct TestApp {
    pub state: AppState,
    pub mailer: MemoryMailer,
    pub router: Router,
}

/// Create AppState for testing, with outgoing email going to `mailer`
pub async fn setup_test_app_state(mailer: MemoryMailer) -> AppState {
    let db = setup_test_db().await;
    build_app_state(db, test_settings(), Arc::new(mailer)).expect("Failed to build app state")
}

/// Create axum app for testing
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_mailer(MemoryMailer::new()).await
}

/// Same as [`setup_test_app`] but delivering through `mailer`, e.g. [`MemoryMailer::failing`].
pub async fn setup_test_app_with_mailer(mailer: MemoryMailer) -> TestApp {
    let _guard = init_test_tracing();

    let state = setup_test_app_state(mailer.clone()).await;
    let router = create_router(state.clone());
    TestApp {
        state,
        mailer,
        router,
    }
}

/// Inserts an active, verified and approved account whose password is [`PASSWORD`].
pub async fn seed_user(state: &AppState, username: &str, is_staff: bool) -> user::Model {
    accounts::create_account(
        &state.db,
        NewAccount {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: PASSWORD.to_string(),
            is_staff,
            is_superuser: false,
        },
    )
    .await
    .expect("Failed to seed user")
}

/// `Authorization` header carrying a fresh access token for `user`.
pub fn bearer(state: &AppState, user: &user::Model) -> (HeaderName, HeaderValue) {
    let token = state
        .tokens
        .issue(user, TokenKind::Access)
        .expect("Failed to issue token");
    let value = HeaderValue::from_str(&format!("Bearer {}", token)).expect("header value");
    (header::AUTHORIZATION, value)
}

/// Initialize tracing for tests with output to STDERR.
///
/// The log level comes from `RUST_LOG`, defaulting to WARN.
pub fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| match level.to_uppercase().as_str() {
            "ERROR" => Some(Level::ERROR),
            "WARN" => Some(Level::WARN),
            "INFO" => Some(Level::INFO),
            "DEBUG" => Some(Level::DEBUG),
            "TRACE" => Some(Level::TRACE),
            _ => None,
        })
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_default(subscriber)
}
