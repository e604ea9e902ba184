use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use domain::access::Viewer;
use domain::content;
use model::entities::skill::{self, SkillLevel};
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
pub struct SkillRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Beginner, Intermediate or Advanced
    pub level: SkillLevel,
    pub icon_image: Option<String>,
}

impl SkillRequest {
    fn apply(self, active: &mut skill::ActiveModel) {
        active.name = Set(self.name);
        active.level = Set(self.level);
        active.icon_image = Set(blank_to_none(self.icon_image));
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub level: Option<SkillLevel>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub icon_image: Option<Option<String>>,
}

impl SkillPatch {
    fn merge(self, current: &skill::Model) -> SkillRequest {
        SkillRequest {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            level: self.level.unwrap_or(current.level),
            icon_image: self
                .icon_image
                .unwrap_or_else(|| current.icon_image.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SkillResponse {
    pub id: i32,
    pub user: Option<i32>,
    pub name: String,
    pub level: SkillLevel,
    pub icon_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SkillResponse {
    pub fn new(model: skill::Model, media: &MediaUrls) -> Self {
        Self {
            id: model.id,
            user: model.user_id,
            icon_image: media.optional(model.icon_image.as_deref()),
            name: model.name,
            level: model.level,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/skills/",
    tag = "content",
    responses(
        (status = 200, description = "Skills retrieved", body = ApiResponse<Vec<SkillResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_skills(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
) -> ApiResult<Json<ApiResponse<Vec<SkillResponse>>>> {
    let skills = content::list::<skill::Entity, _>(&state.db, &Viewer::of(&user)).await?;
    debug!("Found {} skills", skills.len());

    let data = skills
        .into_iter()
        .map(|model| SkillResponse::new(model, &media))
        .collect();
    Ok(Json(ApiResponse::ok(data, "Skills retrieved successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/skills/",
    tag = "content",
    request_body = SkillRequest,
    responses(
        (status = 201, description = "Skill created", body = ApiResponse<SkillResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_skill(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    JsonBody(request): JsonBody<SkillRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SkillResponse>>)> {
    request.validate()?;

    let mut active = skill::ActiveModel {
        user_id: Set(Some(user.id)),
        ..Default::default()
    };
    request.apply(&mut active);
    let created = active.insert(&state.db).await?;
    info!("Skill {} created", created.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            SkillResponse::new(created, &media),
            "Skill created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/skills/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Skill ID")),
    responses(
        (status = 200, description = "Skill retrieved", body = ApiResponse<SkillResponse>),
        (status = 404, description = "Skill not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, skill_id = id))]
pub async fn get_skill(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<SkillResponse>>> {
    let model = content::find::<skill::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    Ok(Json(ApiResponse::ok(
        SkillResponse::new(model, &media),
        "Skill retrieved successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/skills/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Skill ID")),
    request_body = SkillRequest,
    responses(
        (status = 200, description = "Skill updated", body = ApiResponse<SkillResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Skill not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, skill_id = id))]
pub async fn replace_skill(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
    JsonBody(request): JsonBody<SkillRequest>,
) -> ApiResult<Json<ApiResponse<SkillResponse>>> {
    let current = content::find::<skill::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    save(&state, current, request, &media).await
}

#[utoipa::path(
    patch,
    path = "/api/v1/skills/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Skill ID")),
    request_body = SkillPatch,
    responses(
        (status = 200, description = "Skill updated", body = ApiResponse<SkillResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Skill not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, skill_id = id))]
pub async fn update_skill(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
    JsonBody(patch): JsonBody<SkillPatch>,
) -> ApiResult<Json<ApiResponse<SkillResponse>>> {
    let current = content::find::<skill::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    let request = patch.merge(&current);
    save(&state, current, request, &media).await
}

async fn save(
    state: &AppState,
    current: skill::Model,
    request: SkillRequest,
    media: &MediaUrls,
) -> ApiResult<Json<ApiResponse<SkillResponse>>> {
    request.validate()?;

    let mut active = current.into_active_model();
    request.apply(&mut active);
    let updated = active.update(&state.db).await?;
    info!("Skill {} updated", updated.id);

    Ok(Json(ApiResponse::ok(
        SkillResponse::new(updated, media),
        "Skill updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/skills/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Skill ID")),
    responses(
        (status = 200, description = "Skill deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Skill not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, skill_id = id))]
pub async fn delete_skill(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    content::delete::<skill::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    info!("Skill {} deleted", id);
    Ok(Json(ApiResponse::ok(Empty {}, "Skill deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_choices() {
        let ok: SkillRequest =
            serde_json::from_str(r#"{"name": "Rust", "level": "Advanced"}"#).unwrap();
        assert_eq!(ok.level, SkillLevel::Advanced);

        let bad = serde_json::from_str::<SkillRequest>(r#"{"name": "Rust", "level": "Guru"}"#);
        assert!(bad.is_err());
    }
}
