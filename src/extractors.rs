//! Request extractors: bearer authentication, request origin for media URLs, JSON bodies
//! and the JSON-or-HTML preference of browser-facing endpoints.

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header, request::Parts},
};
use domain::AuthFailure;
use domain::tokens::TokenKind;
use model::entities::user;
use sea_orm::EntityTrait;
use std::convert::Infallible;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::helpers::media::MediaUrls;
use crate::schemas::AppState;

/// The authenticated, active account behind a valid access token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

/// Like [`AuthUser`], but a request without credentials is let through as anonymous.
///
/// Credentials that are present but invalid are still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| invalid_token())?;
    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(Some(token.trim()))
        }
        _ => Err(invalid_token()),
    }
}

fn invalid_token() -> ApiError {
    ApiError::from(domain::DomainError::Authentication(AuthFailure::InvalidToken))
}

async fn load_user(state: &AppState, token: &str) -> Result<user::Model, ApiError> {
    let claims = state.tokens.verify(token, TokenKind::Access)?;
    let user_id = claims.user_id()?;

    match user::Entity::find_by_id(user_id).one(&state.db).await? {
        Some(account) if account.is_active => Ok(account),
        Some(_) => {
            warn!("Rejected token of inactive user {}", user_id);
            Err(invalid_token())
        }
        None => {
            warn!("Rejected token of unknown user {}", user_id);
            Err(invalid_token())
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or_else(ApiError::not_authenticated)?;
        let account = load_user(state, token).await?;
        debug!("Authenticated user {}", account.id);
        Ok(AuthUser(account))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => Ok(MaybeAuthUser(Some(load_user(state, token).await?))),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MediaUrls
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok());
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|value| value.to_str().ok());
        Ok(MediaUrls::from_origin(host, scheme))
    }
}

/// Whether the client asked for JSON (`Accept: application/json...`) rather than a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WantsJson(pub bool);

#[axum::async_trait]
impl<S> FromRequestParts<S> for WantsJson
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let json = parts
            .headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|accept| accept.trim_start().starts_with("application/json"));
        Ok(WantsJson(json))
    }
}

/// `axum::Json` whose rejections use the service's error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
