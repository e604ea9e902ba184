use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use domain::{DomainError, FieldErrors};
use sea_orm::DbErr;
use tracing::error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::schemas::ErrorResponse;

/// Every way a handler can fail, mapped onto an HTTP status and an [`ErrorResponse`].
#[derive(Debug)]
pub enum ApiError {
    /// 400 with per-field messages
    Validation(FieldErrors),
    BadRequest(String),
    Unauthorized {
        message: String,
        code: &'static str,
    },
    Forbidden(String),
    NotFound(String),
    /// 500; the detail is logged, never returned
    Internal(String),
}

impl ApiError {
    pub fn not_authenticated() -> Self {
        ApiError::Unauthorized {
            message: "Authentication credentials were not provided.".to_string(),
            code: "not_authenticated",
        }
    }

    /// A single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(FieldErrors::from([(field.to_string(), vec![message.into()])]))
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, code, errors) = match self {
            ApiError::Validation(errors) => (
                "Invalid input.".to_string(),
                "invalid".to_string(),
                Some(errors),
            ),
            ApiError::BadRequest(message) => (message, "bad_request".to_string(), None),
            ApiError::Unauthorized { message, code } => (message, code.to_string(), None),
            ApiError::Forbidden(message) => (message, "permission_denied".to_string(), None),
            ApiError::NotFound(message) => (message, "not_found".to_string(), None),
            ApiError::Internal(detail) => {
                error!("Internal server error: {}", detail);
                (
                    "An internal server error occurred.".to_string(),
                    "server_error".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error,
            code,
            success: false,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Authentication(failure) => ApiError::Unauthorized {
                message: failure.message().to_string(),
                code: failure.code(),
            },
            DomainError::Validation(errors) => ApiError::Validation(errors),
            DomainError::Rejected(message) => ApiError::BadRequest(message),
            DomainError::NotFound(message) => ApiError::NotFound(message),
            DomainError::PermissionDenied(message) => ApiError::Forbidden(message),
            DomainError::Database(_) | DomainError::PasswordHash(_) | DomainError::Token(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        ApiError::Internal(format!("Database error: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(field_errors(&errors))
    }
}

/// Flattens `validator` output into `field -> [messages]`.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut fields = FieldErrors::new();
    for (field, kind) in errors.errors() {
        if let ValidationErrorsKind::Field(problems) = kind {
            let messages = problems
                .iter()
                .map(|problem| match &problem.message {
                    Some(message) => message.to_string(),
                    None => default_message(&problem.code).to_string(),
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
    }
    fields
}

fn default_message(code: &str) -> &'static str {
    match code {
        "email" => "Enter a valid email address.",
        "url" => "Enter a valid URL.",
        "length" => "Ensure this field has a valid length.",
        "range" => "Ensure this value is within the allowed range.",
        "required" => "This field is required.",
        _ => "This value is invalid.",
    }
}

/// Shorthand for handler results.
pub type ApiResult<T> = Result<T, ApiError>;
