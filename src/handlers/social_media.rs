use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use domain::access::Viewer;
use domain::content;
use model::entities::social_media::{self, Platform};
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::ApiResult;
use crate::extractors::{AuthUser, JsonBody};
use crate::helpers::media::MediaUrls;
use crate::helpers::patch::{blank_to_none, double_option};
use crate::schemas::{ApiResponse, AppState, Empty, ErrorResponse};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct SocialMediaRequest {
    /// Defaults to `other`
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub platform_name: String,
    #[validate(url)]
    pub url: String,
    pub icon_image: Option<String>,
}

impl SocialMediaRequest {
    fn apply(self, active: &mut social_media::ActiveModel) {
        active.platform = Set(self.platform);
        active.platform_name = Set(self.platform_name);
        active.url = Set(self.url);
        active.icon_image = Set(blank_to_none(self.icon_image));
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SocialMediaPatch {
    pub platform: Option<Platform>,
    pub platform_name: Option<String>,
    pub url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub icon_image: Option<Option<String>>,
}

impl SocialMediaPatch {
    fn merge(self, current: &social_media::Model) -> SocialMediaRequest {
        SocialMediaRequest {
            platform: self.platform.unwrap_or(current.platform),
            platform_name: self
                .platform_name
                .unwrap_or_else(|| current.platform_name.clone()),
            url: self.url.unwrap_or_else(|| current.url.clone()),
            icon_image: self
                .icon_image
                .unwrap_or_else(|| current.icon_image.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SocialMediaResponse {
    pub id: i32,
    pub user: Option<i32>,
    pub platform: Platform,
    pub platform_name: String,
    pub url: String,
    pub icon_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SocialMediaResponse {
    pub fn new(model: social_media::Model, media: &MediaUrls) -> Self {
        Self {
            id: model.id,
            user: model.user_id,
            icon_image: media.optional(model.icon_image.as_deref()),
            platform: model.platform,
            platform_name: model.platform_name,
            url: model.url,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/social-media/",
    tag = "content",
    responses(
        (status = 200, description = "Links retrieved", body = ApiResponse<Vec<SocialMediaResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_social_media(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
) -> ApiResult<Json<ApiResponse<Vec<SocialMediaResponse>>>> {
    let links = content::list::<social_media::Entity, _>(&state.db, &Viewer::of(&user)).await?;
    debug!("Found {} social media links", links.len());

    let data = links
        .into_iter()
        .map(|model| SocialMediaResponse::new(model, &media))
        .collect();
    Ok(Json(ApiResponse::ok(data, "Social media retrieved successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/social-media/",
    tag = "content",
    request_body = SocialMediaRequest,
    responses(
        (status = 201, description = "Link created", body = ApiResponse<SocialMediaResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_social_media(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    JsonBody(request): JsonBody<SocialMediaRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SocialMediaResponse>>)> {
    request.validate()?;

    let mut active = social_media::ActiveModel {
        user_id: Set(Some(user.id)),
        ..Default::default()
    };
    request.apply(&mut active);
    let created = active.insert(&state.db).await?;
    info!("Social media link {} created", created.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            SocialMediaResponse::new(created, &media),
            "Social media created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/social-media/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Social media link ID")),
    responses(
        (status = 200, description = "Link retrieved", body = ApiResponse<SocialMediaResponse>),
        (status = 404, description = "Link not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, link_id = id))]
pub async fn get_social_media(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<SocialMediaResponse>>> {
    let model = content::find::<social_media::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    Ok(Json(ApiResponse::ok(
        SocialMediaResponse::new(model, &media),
        "Social media retrieved successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/social-media/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Social media link ID")),
    request_body = SocialMediaRequest,
    responses(
        (status = 200, description = "Link updated", body = ApiResponse<SocialMediaResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Link not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, link_id = id))]
pub async fn replace_social_media(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
    JsonBody(request): JsonBody<SocialMediaRequest>,
) -> ApiResult<Json<ApiResponse<SocialMediaResponse>>> {
    let current = content::find::<social_media::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    save(&state, current, request, &media).await
}

#[utoipa::path(
    patch,
    path = "/api/v1/social-media/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Social media link ID")),
    request_body = SocialMediaPatch,
    responses(
        (status = 200, description = "Link updated", body = ApiResponse<SocialMediaResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Link not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, link_id = id))]
pub async fn update_social_media(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
    JsonBody(patch): JsonBody<SocialMediaPatch>,
) -> ApiResult<Json<ApiResponse<SocialMediaResponse>>> {
    let current = content::find::<social_media::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    let request = patch.merge(&current);
    save(&state, current, request, &media).await
}

async fn save(
    state: &AppState,
    current: social_media::Model,
    request: SocialMediaRequest,
    media: &MediaUrls,
) -> ApiResult<Json<ApiResponse<SocialMediaResponse>>> {
    request.validate()?;

    let mut active = current.into_active_model();
    request.apply(&mut active);
    let updated = active.update(&state.db).await?;
    info!("Social media link {} updated", updated.id);

    Ok(Json(ApiResponse::ok(
        SocialMediaResponse::new(updated, media),
        "Social media updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/social-media/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Social media link ID")),
    responses(
        (status = 200, description = "Link deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Link not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, link_id = id))]
pub async fn delete_social_media(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    content::delete::<social_media::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    info!("Social media link {} deleted", id);
    Ok(Json(ApiResponse::ok(Empty {}, "Social media deleted successfully")))
}
