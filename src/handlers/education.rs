use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use domain::access::Viewer;
use domain::content;
use model::entities::education;
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::ApiResult;
use crate::extractors::{AuthUser, JsonBody};
use crate::helpers::patch::{blank_to_none, double_option};
use crate::schemas::{ApiResponse, AppState, Empty, ErrorResponse};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct EducationRequest {
    #[validate(length(min = 1, max = 200))]
    pub institution: String,
    #[validate(length(min = 1, max = 200))]
    pub degree: String,
    #[validate(range(min = 1900, max = 2100))]
    pub start_year: i32,
    #[validate(range(min = 1900, max = 2100))]
    pub end_year: Option<i32>,
    pub description: Option<String>,
}

impl EducationRequest {
    fn apply(self, active: &mut education::ActiveModel) {
        active.institution = Set(self.institution);
        active.degree = Set(self.degree);
        active.start_year = Set(self.start_year);
        active.end_year = Set(self.end_year);
        active.description = Set(blank_to_none(self.description));
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct EducationPatch {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub start_year: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub end_year: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
}

impl EducationPatch {
    fn merge(self, current: &education::Model) -> EducationRequest {
        EducationRequest {
            institution: self
                .institution
                .unwrap_or_else(|| current.institution.clone()),
            degree: self.degree.unwrap_or_else(|| current.degree.clone()),
            start_year: self.start_year.unwrap_or(current.start_year),
            end_year: self.end_year.unwrap_or(current.end_year),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct EducationResponse {
    pub id: i32,
    pub user: Option<i32>,
    pub institution: String,
    pub degree: String,
    pub start_year: i32,
    pub end_year: Option<i32>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<education::Model> for EducationResponse {
    fn from(model: education::Model) -> Self {
        Self {
            id: model.id,
            user: model.user_id,
            institution: model.institution,
            degree: model.degree,
            start_year: model.start_year,
            end_year: model.end_year,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/education/",
    tag = "content",
    responses(
        (status = 200, description = "Entries retrieved", body = ApiResponse<Vec<EducationResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_educations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<EducationResponse>>>> {
    let entries = content::list::<education::Entity, _>(&state.db, &Viewer::of(&user)).await?;
    debug!("Found {} education entries", entries.len());

    let data = entries.into_iter().map(EducationResponse::from).collect();
    Ok(Json(ApiResponse::ok(data, "Education retrieved successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/education/",
    tag = "content",
    request_body = EducationRequest,
    responses(
        (status = 201, description = "Entry created", body = ApiResponse<EducationResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_education(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(request): JsonBody<EducationRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<EducationResponse>>)> {
    request.validate()?;

    let mut active = education::ActiveModel {
        user_id: Set(Some(user.id)),
        ..Default::default()
    };
    request.apply(&mut active);
    let created = active.insert(&state.db).await?;
    info!("Education {} created", created.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            EducationResponse::from(created),
            "Education created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/education/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Education ID")),
    responses(
        (status = 200, description = "Entry retrieved", body = ApiResponse<EducationResponse>),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, education_id = id))]
pub async fn get_education(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<EducationResponse>>> {
    let model = content::find::<education::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    Ok(Json(ApiResponse::ok(
        EducationResponse::from(model),
        "Education retrieved successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/education/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Education ID")),
    request_body = EducationRequest,
    responses(
        (status = 200, description = "Entry updated", body = ApiResponse<EducationResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, education_id = id))]
pub async fn replace_education(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    JsonBody(request): JsonBody<EducationRequest>,
) -> ApiResult<Json<ApiResponse<EducationResponse>>> {
    let current = content::find::<education::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    save(&state, current, request).await
}

#[utoipa::path(
    patch,
    path = "/api/v1/education/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Education ID")),
    request_body = EducationPatch,
    responses(
        (status = 200, description = "Entry updated", body = ApiResponse<EducationResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, education_id = id))]
pub async fn update_education(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    JsonBody(patch): JsonBody<EducationPatch>,
) -> ApiResult<Json<ApiResponse<EducationResponse>>> {
    let current = content::find::<education::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    let request = patch.merge(&current);
    save(&state, current, request).await
}

async fn save(
    state: &AppState,
    current: education::Model,
    request: EducationRequest,
) -> ApiResult<Json<ApiResponse<EducationResponse>>> {
    request.validate()?;

    let mut active = current.into_active_model();
    request.apply(&mut active);
    let updated = active.update(&state.db).await?;
    info!("Education {} updated", updated.id);

    Ok(Json(ApiResponse::ok(
        EducationResponse::from(updated),
        "Education updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/education/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Education ID")),
    responses(
        (status = 200, description = "Entry deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, education_id = id))]
pub async fn delete_education(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    content::delete::<education::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    info!("Education {} deleted", id);
    Ok(Json(ApiResponse::ok(Empty {}, "Education deleted successfully")))
}
