use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use domain::accounts::{self, Registration, VerificationOutcome};
use domain::tokens::TokenKind;
use domain::{DomainError, secrets};
use model::entities::user;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{ApiError, ApiResult, field_errors};
use crate::extractors::{JsonBody, WantsJson};
use crate::schemas::{ApiResponse, AppState, Empty, ErrorResponse};

const ALREADY_USED_MESSAGE: &str = "This verification link has already been used. If your email was successfully verified, you can proceed to login. If not, please contact support.";
const ALREADY_USED_SUGGESTION: &str = "Try logging in to check if your email is verified.";
const RESEND_MESSAGE: &str =
    "If an unverified account exists with this email, a new verification link has been sent.";
const RESET_REQUESTED_MESSAGE: &str =
    "If an account exists with this email, a password reset link has been sent.";

/// Request body for logging in with a username or an email address
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username_or_email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct TokenPairResponse {
    /// Long-lived token accepted by `/auth/refresh/`
    pub refresh: String,
    /// Bearer token for authenticated endpoints
    pub access: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AccessToken {
    pub access: String,
}

/// Request body for self-service registration
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "Enter a username of at most 150 characters."))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    pub password: String,
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user_id: i32,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
}

#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct PasswordResetConfirmRequest {
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    pub new_password: String,
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    pub new_password_confirm: String,
}

/// JSON form of a verification result
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct VerificationResponse {
    /// The link flipped the account to verified just now
    pub verified: bool,
    /// The token is unknown; it may have been consumed earlier
    pub already_used: bool,
    pub suggestion: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Log in with a username or email address
#[utoipa::path(
    post,
    path = "/api/v1/auth/login/",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair issued", body = ApiResponse<TokenPairResponse>),
        (status = 401, description = "Credentials refused", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Json<ApiResponse<TokenPairResponse>>> {
    trace!("Entering login function");
    let identifier = request.username_or_email.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    let account = accounts::authenticate(&state.db, &identifier, &password)
        .await
        .inspect_err(|e| {
            if let DomainError::Authentication(failure) = e {
                warn!("Login refused: {}", failure.code());
            }
        })?;

    let pair = state.tokens.issue_pair(&account)?;
    info!("User {} logged in", account.id);

    Ok(Json(ApiResponse::ok(
        TokenPairResponse {
            refresh: pair.refresh,
            access: pair.access,
        },
        "Login successful",
    )))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh/",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Access token issued", body = ApiResponse<AccessToken>),
        (status = 401, description = "Refresh token refused", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<AccessToken>>> {
    let claims = state.tokens.verify(&request.refresh, TokenKind::Refresh)?;
    let user_id = claims.user_id()?;

    let account = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .filter(|account| account.is_active)
        .ok_or_else(|| {
            warn!("Refresh refused for missing or inactive user {}", user_id);
            ApiError::from(DomainError::Authentication(domain::AuthFailure::InvalidToken))
        })?;

    let access = state.tokens.issue(&account, TokenKind::Access)?;
    debug!("Issued access token for user {}", account.id);
    Ok(Json(ApiResponse::ok(AccessToken { access }, "Token refreshed")))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register/",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification email sent", body = ApiResponse<RegisterResponse>),
        (status = 400, description = "Invalid registration data", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
    trace!("Entering register function");
    debug!("Registering username: {}", request.username);

    let mut errors = request
        .validate()
        .err()
        .map(|e| field_errors(&e))
        .unwrap_or_default();
    if request.password != request.password_confirm {
        errors
            .entry("password".to_string())
            .or_default()
            .push("Passwords do not match.".to_string());
    }
    if !errors.is_empty() {
        debug!("Registration rejected: {:?}", errors.keys().collect::<Vec<_>>());
        return Err(ApiError::Validation(errors));
    }

    let (account, profile) = accounts::register(
        &state.db,
        Registration {
            username: request.username,
            email: request.email,
            password: request.password,
            first_name: request.first_name.unwrap_or_default(),
            last_name: request.last_name.unwrap_or_default(),
        },
    )
    .await?;

    if let Some(token) = profile.email_verification_token.as_deref() {
        if let Err(e) = state.notifier.send_verification(&account, token).await {
            error!("Failed to send verification email to user {}: {}", account.id, e);
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            RegisterResponse { user_id: account.id },
            "Registration successful! Please check your email to verify your account.",
        )),
    ))
}

/// Follow an email verification link
#[utoipa::path(
    get,
    path = "/api/v1/auth/verify-email/{token}/",
    tag = "auth",
    params(("token" = String, Path, description = "Verification token from the email")),
    responses(
        (status = 200, description = "Verification result (JSON or HTML)", body = ApiResponse<VerificationResponse>),
        (status = 400, description = "Invalid token", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn verify_email(
    State(state): State<AppState>,
    WantsJson(json): WantsJson,
    Path(token): Path<String>,
) -> ApiResult<Response> {
    verification_response(&state, &token, json).await
}

/// Email verification with the token in the query string
#[utoipa::path(
    get,
    path = "/api/v1/auth/verify-email-otp/",
    tag = "auth",
    params(TokenQuery),
    responses(
        (status = 200, description = "Verification result (JSON or HTML)", body = ApiResponse<VerificationResponse>),
        (status = 400, description = "Invalid token", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn verify_email_query(
    State(state): State<AppState>,
    WantsJson(json): WantsJson,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Response> {
    let token = query.token.unwrap_or_default();
    verification_response(&state, &token, json).await
}

async fn verification_response(state: &AppState, token: &str, json: bool) -> ApiResult<Response> {
    let outcome = match accounts::verify_email(&state.db, token).await {
        Ok(outcome) => outcome,
        Err(DomainError::Rejected(message)) => {
            warn!("Verification with a blank token");
            if json {
                return Err(ApiError::BadRequest(message));
            }
            let page = render_page(state, false, &message, None)?;
            return Ok((StatusCode::BAD_REQUEST, Html(page)).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let (message, body) = match outcome {
        VerificationOutcome::Verified => (
            "Email verified successfully! Your account is pending admin approval.",
            VerificationResponse {
                verified: true,
                already_used: false,
                suggestion: None,
            },
        ),
        VerificationOutcome::AlreadyVerified => (
            "Your email has already been verified. You can proceed to login.",
            VerificationResponse {
                verified: false,
                already_used: false,
                suggestion: None,
            },
        ),
        VerificationOutcome::UnknownToken => {
            info!("Verification token not found; treating it as already used");
            (
                ALREADY_USED_MESSAGE,
                VerificationResponse {
                    verified: false,
                    already_used: true,
                    suggestion: Some(ALREADY_USED_SUGGESTION.to_string()),
                },
            )
        }
    };

    if json {
        return Ok(Json(ApiResponse::ok(body, message)).into_response());
    }
    let page = render_page(state, true, message, body.suggestion.as_deref())?;
    Ok(Html(page).into_response())
}

fn render_page(
    state: &AppState,
    success: bool,
    message: &str,
    suggestion: Option<&str>,
) -> ApiResult<String> {
    state
        .notifier
        .render_verification_page(success, message, suggestion)
        .map_err(|e| ApiError::Internal(format!("Verification page failed to render: {}", e)))
}

/// Send a fresh verification link
#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-verification-otp/",
    tag = "auth",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Request accepted", body = ApiResponse<Empty>),
        (status = 400, description = "Malformed email", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn resend_verification(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<EmailRequest>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    request.validate()?;

    if let Some((account, token)) = accounts::reissue_verification(&state.db, &request.email).await? {
        info!("Reissued verification token for user {}", account.id);
        if let Err(e) = state.notifier.send_verification(&account, &token).await {
            error!("Failed to resend verification email to user {}: {}", account.id, e);
        }
    }

    Ok(Json(ApiResponse::ok(Empty {}, RESEND_MESSAGE)))
}

/// Request a password reset link
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/",
    tag = "auth",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Request accepted", body = ApiResponse<Empty>),
        (status = 400, description = "Malformed email", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn password_reset_request(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<EmailRequest>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    request.validate()?;

    if let Some((account, token)) = accounts::request_password_reset(&state.db, &request.email).await? {
        if let Err(e) = state.notifier.send_password_reset(&account, &token).await {
            error!("Failed to send password reset email to user {}: {}", account.id, e);
        }
    }

    Ok(Json(ApiResponse::ok(Empty {}, RESET_REQUESTED_MESSAGE)))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/v1/auth/password-reset/{token}/",
    tag = "auth",
    params(("token" = String, Path, description = "Reset token from the email")),
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<Empty>),
        (status = 400, description = "Invalid token or passwords", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Path(token): Path<String>,
    JsonBody(request): JsonBody<PasswordResetConfirmRequest>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    if secrets::is_blank_token(&token) {
        return Err(ApiError::BadRequest("Invalid or expired reset token.".to_string()));
    }

    let mut errors = request
        .validate()
        .err()
        .map(|e| field_errors(&e))
        .unwrap_or_default();
    if request.new_password != request.new_password_confirm {
        errors
            .entry("new_password".to_string())
            .or_default()
            .push("Passwords do not match.".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    accounts::reset_password(&state.db, &token, &request.new_password).await?;

    Ok(Json(ApiResponse::ok(
        Empty {},
        "Password reset successfully! You can now login with your new password.",
    )))
}
