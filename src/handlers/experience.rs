use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use domain::access::Viewer;
use domain::content;
use model::entities::experience;
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::ApiResult;
use crate::extractors::{AuthUser, JsonBody};
use crate::helpers::patch::double_option;
use crate::schemas::{ApiResponse, AppState, Empty, ErrorResponse};

/// Request body for creating or replacing an experience entry
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct ExperienceRequest {
    #[validate(length(min = 1, max = 100))]
    pub role: String,
    #[validate(length(min = 1, max = 100))]
    pub company: String,
    pub start_date: NaiveDate,
    /// Empty while the role is current
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

impl ExperienceRequest {
    fn apply(self, active: &mut experience::ActiveModel) {
        active.role = Set(self.role);
        active.company = Set(self.company);
        active.start_date = Set(self.start_date);
        active.end_date = Set(self.end_date);
        active.description = Set(self.description);
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ExperiencePatch {
    pub role: Option<String>,
    pub company: Option<String>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<Option<NaiveDate>>,
    pub description: Option<String>,
}

impl ExperiencePatch {
    fn merge(self, current: &experience::Model) -> ExperienceRequest {
        ExperienceRequest {
            role: self.role.unwrap_or_else(|| current.role.clone()),
            company: self.company.unwrap_or_else(|| current.company.clone()),
            start_date: self.start_date.unwrap_or(current.start_date),
            end_date: self.end_date.unwrap_or(current.end_date),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ExperienceResponse {
    pub id: i32,
    pub user: Option<i32>,
    pub role: String,
    pub company: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<experience::Model> for ExperienceResponse {
    fn from(model: experience::Model) -> Self {
        Self {
            id: model.id,
            user: model.user_id,
            role: model.role,
            company: model.company,
            start_date: model.start_date,
            end_date: model.end_date,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List experience entries visible to the caller, latest start first
#[utoipa::path(
    get,
    path = "/api/v1/experience/",
    tag = "content",
    responses(
        (status = 200, description = "Entries retrieved", body = ApiResponse<Vec<ExperienceResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_experiences(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<ExperienceResponse>>>> {
    let entries = content::list::<experience::Entity, _>(&state.db, &Viewer::of(&user)).await?;
    debug!("Found {} experience entries", entries.len());

    let data = entries.into_iter().map(ExperienceResponse::from).collect();
    Ok(Json(ApiResponse::ok(data, "Experience retrieved successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/experience/",
    tag = "content",
    request_body = ExperienceRequest,
    responses(
        (status = 201, description = "Entry created", body = ApiResponse<ExperienceResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_experience(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(request): JsonBody<ExperienceRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ExperienceResponse>>)> {
    request.validate()?;

    let mut active = experience::ActiveModel {
        user_id: Set(Some(user.id)),
        ..Default::default()
    };
    request.apply(&mut active);
    let created = active.insert(&state.db).await?;
    info!("Experience {} created", created.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            ExperienceResponse::from(created),
            "Experience created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/experience/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Experience ID")),
    responses(
        (status = 200, description = "Entry retrieved", body = ApiResponse<ExperienceResponse>),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, experience_id = id))]
pub async fn get_experience(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<ExperienceResponse>>> {
    let model = content::find::<experience::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    Ok(Json(ApiResponse::ok(
        ExperienceResponse::from(model),
        "Experience retrieved successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/experience/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Experience ID")),
    request_body = ExperienceRequest,
    responses(
        (status = 200, description = "Entry updated", body = ApiResponse<ExperienceResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, experience_id = id))]
pub async fn replace_experience(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    JsonBody(request): JsonBody<ExperienceRequest>,
) -> ApiResult<Json<ApiResponse<ExperienceResponse>>> {
    let current = content::find::<experience::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    save(&state, current, request).await
}

#[utoipa::path(
    patch,
    path = "/api/v1/experience/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Experience ID")),
    request_body = ExperiencePatch,
    responses(
        (status = 200, description = "Entry updated", body = ApiResponse<ExperienceResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, experience_id = id))]
pub async fn update_experience(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    JsonBody(patch): JsonBody<ExperiencePatch>,
) -> ApiResult<Json<ApiResponse<ExperienceResponse>>> {
    let current = content::find::<experience::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    let request = patch.merge(&current);
    save(&state, current, request).await
}

async fn save(
    state: &AppState,
    current: experience::Model,
    request: ExperienceRequest,
) -> ApiResult<Json<ApiResponse<ExperienceResponse>>> {
    request.validate()?;

    let mut active = current.into_active_model();
    request.apply(&mut active);
    let updated = active.update(&state.db).await?;
    info!("Experience {} updated", updated.id);

    Ok(Json(ApiResponse::ok(
        ExperienceResponse::from(updated),
        "Experience updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/experience/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Experience ID")),
    responses(
        (status = 200, description = "Entry deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, experience_id = id))]
pub async fn delete_experience(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    content::delete::<experience::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    info!("Experience {} deleted", id);
    Ok(Json(ApiResponse::ok(Empty {}, "Experience deleted successfully")))
}
