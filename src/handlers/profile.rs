use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use domain::profiles::{self, ProfileChanges};
use domain::publish::{PublishActor, PublishEvent};
use model::entities::{profile, user};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

use crate::error::ApiResult;
use crate::extractors::{AuthUser, JsonBody};
use crate::helpers::media::MediaUrls;
use crate::helpers::patch::double_option;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// A profile together with the account fields shown next to it
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username_slug: Option<String>,
    pub portfolio_published: bool,
    pub is_approved: bool,
    pub email_verified: bool,
    /// Absolute URL of the banner image
    pub banner_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileResponse {
    pub fn new(profile: profile::Model, owner: &user::Model, media: &MediaUrls) -> Self {
        Self {
            id: profile.id,
            username: owner.username.clone(),
            email: owner.email.clone(),
            first_name: owner.first_name.clone(),
            last_name: owner.last_name.clone(),
            username_slug: profile.username_slug,
            portfolio_published: profile.portfolio_published,
            is_approved: profile.is_approved,
            email_verified: profile.email_verified,
            banner_image: media.optional(profile.banner_image.as_deref()),
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Writable profile fields. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ProfileUpdateRequest {
    /// Blank regenerates the slug from the username
    pub username_slug: Option<String>,
    pub portfolio_published: Option<bool>,
    /// `null` removes the banner
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub banner_image: Option<Option<String>>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CurrentUserResponse {
    #[serde(flatten)]
    pub profile: ProfileResponse,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Emails the owner about a publication change. Failures are logged only.
pub(crate) async fn notify_publication(
    state: &AppState,
    owner: &user::Model,
    profile: &profile::Model,
    event: Option<PublishEvent>,
) {
    let Some(event) = event else {
        return;
    };
    if let Err(e) = state
        .notifier
        .send_portfolio_status(owner, profile.username_slug.as_deref(), event)
        .await
    {
        error!("Failed to send portfolio status email to user {}: {}", owner.id, e);
    }
}

/// Get the signed-in user's profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/profile/",
    tag = "profile",
    responses(
        (status = 200, description = "Profile retrieved", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
) -> ApiResult<Json<ApiResponse<ProfileResponse>>> {
    let profile = profiles::get_or_create(&state.db, &user).await?;
    debug!("Loaded profile {}", profile.id);

    Ok(Json(ApiResponse::ok(
        ProfileResponse::new(profile, &user, &media),
        "Profile retrieved successfully",
    )))
}

/// Update the signed-in user's profile
#[utoipa::path(
    patch,
    path = "/api/v1/auth/profile/",
    tag = "profile",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Invalid or taken slug", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    JsonBody(request): JsonBody<ProfileUpdateRequest>,
) -> ApiResult<Json<ApiResponse<ProfileResponse>>> {
    let changes = ProfileChanges {
        username_slug: request.username_slug,
        portfolio_published: request.portfolio_published,
        banner_image: request.banner_image,
    };

    let (profile, event) = profiles::update(&state.db, &user, changes, PublishActor::Owner).await?;
    info!("Profile {} updated", profile.id);
    notify_publication(&state, &user, &profile, event).await;

    Ok(Json(ApiResponse::ok(
        ProfileResponse::new(profile, &user, &media),
        "Profile updated successfully",
    )))
}

/// Who am I: profile plus role flags
#[utoipa::path(
    get,
    path = "/api/v1/auth/me/",
    tag = "profile",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<CurrentUserResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn current_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
) -> ApiResult<Json<ApiResponse<CurrentUserResponse>>> {
    let profile = profiles::get_or_create(&state.db, &user).await?;

    Ok(Json(ApiResponse::ok(
        CurrentUserResponse {
            profile: ProfileResponse::new(profile, &user, &media),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        },
        "Current user retrieved successfully",
    )))
}
