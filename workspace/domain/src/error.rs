use std::collections::BTreeMap;

use thiserror::Error;

/// Field name to the list of problems found with it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Error types for the domain layer
#[derive(Error, Debug)]
pub enum DomainError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Credentials or a token were refused
    #[error("{}", .0.message())]
    Authentication(AuthFailure),

    /// One or more input fields are invalid
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// The request is well-formed but not acceptable in the current state
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PermissionDenied(String),

    /// Error from password hashing
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Error while signing a token
    #[error("Token error: {0}")]
    Token(String),
}

impl DomainError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        DomainError::Validation(errors)
    }
}

/// Why a login or token check failed.
///
/// Credential problems share one message so callers cannot tell which part was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingCredentials,
    InvalidCredentials,
    EmailNotVerified,
    PendingApproval,
    AccountNotSetUp,
    InvalidToken,
}

impl AuthFailure {
    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::MissingCredentials => {
                "Must include \"username_or_email\" and \"password\"."
            }
            AuthFailure::InvalidCredentials => {
                "No active account found with the given credentials."
            }
            AuthFailure::EmailNotVerified => {
                "Please verify your email address before logging in. Check your inbox for the verification link."
            }
            AuthFailure::PendingApproval => {
                "Your account is pending approval. Please wait for admin approval."
            }
            AuthFailure::AccountNotSetUp => "Account not properly set up. Please contact support.",
            AuthFailure::InvalidToken => "Token is invalid or expired.",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthFailure::MissingCredentials => "missing_credentials",
            AuthFailure::InvalidCredentials => "no_active_account",
            AuthFailure::EmailNotVerified => "email_not_verified",
            AuthFailure::PendingApproval => "account_pending_approval",
            AuthFailure::AccountNotSetUp => "account_not_setup",
            AuthFailure::InvalidToken => "token_not_valid",
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
