use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use domain::access::Viewer;
use domain::content;
use model::entities::project;
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

/// Request body for creating or replacing a project
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct ProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Stored media path or URL
    pub project_image: Option<String>,
    #[validate(url)]
    pub github_link: Option<String>,
    #[validate(url)]
    pub live_demo_link: Option<String>,
}

impl ProjectRequest {
    fn normalized(self) -> Self {
        Self {
            project_image: blank_to_none(self.project_image),
            github_link: blank_to_none(self.github_link),
            live_demo_link: blank_to_none(self.live_demo_link),
            ..self
        }
    }

    fn apply(self, active: &mut project::ActiveModel) {
        active.title = Set(self.title);
        active.description = Set(self.description);
        active.project_image = Set(self.project_image);
        active.github_link = Set(self.github_link);
        active.live_demo_link = Set(self.live_demo_link);
    }
}

/// Partial update; `null` clears a nullable field
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub project_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub github_link: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub live_demo_link: Option<Option<String>>,
}

impl ProjectPatch {
    fn merge(self, current: &project::Model) -> ProjectRequest {
        ProjectRequest {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .unwrap_or_else(|| current.description.clone()),
            project_image: self
                .project_image
                .unwrap_or_else(|| current.project_image.clone()),
            github_link: self
                .github_link
                .unwrap_or_else(|| current.github_link.clone()),
            live_demo_link: self
                .live_demo_link
                .unwrap_or_else(|| current.live_demo_link.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: i32,
    /// Owner ID
    pub user: Option<i32>,
    pub title: String,
    pub description: String,
    pub project_image: Option<String>,
    pub github_link: Option<String>,
    pub live_demo_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectResponse {
    pub fn new(model: project::Model, media: &MediaUrls) -> Self {
        Self {
            id: model.id,
            user: model.user_id,
            project_image: media.optional(model.project_image.as_deref()),
            title: model.title,
            description: model.description,
            github_link: model.github_link,
            live_demo_link: model.live_demo_link,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List projects visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/projects/",
    tag = "content",
    responses(
        (status = 200, description = "Projects retrieved", body = ApiResponse<Vec<ProjectResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_projects(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
) -> ApiResult<Json<ApiResponse<Vec<ProjectResponse>>>> {
    let projects = content::list::<project::Entity, _>(&state.db, &Viewer::of(&user)).await?;
    debug!("Found {} projects", projects.len());

    let data = projects
        .into_iter()
        .map(|model| ProjectResponse::new(model, &media))
        .collect();
    Ok(Json(ApiResponse::ok(data, "Projects retrieved successfully")))
}

/// Create a project owned by the caller
#[utoipa::path(
    post,
    path = "/api/v1/projects/",
    tag = "content",
    request_body = ProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ApiResponse<ProjectResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    JsonBody(request): JsonBody<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ProjectResponse>>)> {
    let request = request.normalized();
    request.validate()?;

    let mut active = project::ActiveModel {
        user_id: Set(Some(user.id)),
        ..Default::default()
    };
    request.apply(&mut active);
    let created = active.insert(&state.db).await?;
    info!("Project {} created", created.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            ProjectResponse::new(created, &media),
            "Project created successfully",
        )),
    ))
}

/// Get one project
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project retrieved", body = ApiResponse<ProjectResponse>),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, project_id = id))]
pub async fn get_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<ProjectResponse>>> {
    let model = content::find::<project::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    Ok(Json(ApiResponse::ok(
        ProjectResponse::new(model, &media),
        "Project retrieved successfully",
    )))
}

/// Replace a project
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = ProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ApiResponse<ProjectResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, project_id = id))]
pub async fn replace_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
    JsonBody(request): JsonBody<ProjectRequest>,
) -> ApiResult<Json<ApiResponse<ProjectResponse>>> {
    let current = content::find::<project::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    save(&state, current, request.normalized(), &media).await
}

/// Partially update a project
#[utoipa::path(
    patch,
    path = "/api/v1/projects/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = ProjectPatch,
    responses(
        (status = 200, description = "Project updated", body = ApiResponse<ProjectResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, project_id = id))]
pub async fn update_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
    JsonBody(patch): JsonBody<ProjectPatch>,
) -> ApiResult<Json<ApiResponse<ProjectResponse>>> {
    let current = content::find::<project::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    let request = patch.merge(&current).normalized();
    save(&state, current, request, &media).await
}

async fn save(
    state: &AppState,
    current: project::Model,
    request: ProjectRequest,
    media: &MediaUrls,
) -> ApiResult<Json<ApiResponse<ProjectResponse>>> {
    request.validate()?;

    let mut active = current.into_active_model();
    request.apply(&mut active);
    let updated = active.update(&state.db).await?;
    info!("Project {} updated", updated.id);

    Ok(Json(ApiResponse::ok(
        ProjectResponse::new(updated, media),
        "Project updated successfully",
    )))
}

/// Delete a project
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, project_id = id))]
pub async fn delete_project(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    content::delete::<project::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    info!("Project {} deleted", id);
    Ok(Json(ApiResponse::ok(Empty {}, "Project deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> project::Model {
        project::Model {
            id: 1,
            user_id: Some(4),
            title: "Site".to_string(),
            description: "My site".to_string(),
            project_image: Some("projects/site.png".to_string()),
            github_link: Some("https://github.com/me/site".to_string()),
            live_demo_link: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_patch_clears_and_keeps() {
        let patch: ProjectPatch =
            serde_json::from_str(r#"{"github_link": null, "title": "Blog"}"#).unwrap();
        let merged = patch.merge(&stored());
        assert_eq!(merged.title, "Blog");
        assert_eq!(merged.github_link, None);
        assert_eq!(merged.project_image.as_deref(), Some("projects/site.png"));
    }

    #[test]
    fn test_link_must_be_url() {
        let request = ProjectRequest {
            title: "Site".to_string(),
            description: String::new(),
            project_image: None,
            github_link: Some("not a link".to_string()),
            live_demo_link: Some("  ".to_string()),
        }
        .normalized();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("github_link"));
        assert!(!errors.field_errors().contains_key("live_demo_link"));
    }
}
