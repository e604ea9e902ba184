use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use domain::access::Viewer;
use domain::content;
use model::entities::about_me;
use sea_orm::{ActiveModelTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::ApiResult;
use crate::extractors::{AuthUser, JsonBody};
use crate::helpers::media::MediaUrls;
use crate::helpers::patch::{blank_to_none, double_option};
use crate::schemas::{ApiResponse, AppState, Empty, ErrorResponse};

const LOGO_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "svg", "svgz"];

fn validate_logo_extension(path: &str) -> Result<(), ValidationError> {
    let extension = path
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase());
    match extension {
        Some(extension) if LOGO_EXTENSIONS.contains(&extension.as_str()) => Ok(()),
        _ => {
            let mut error = ValidationError::new("extension");
            error.message = Some(
                format!(
                    "File extension is not allowed. Allowed extensions are: {}.",
                    LOGO_EXTENSIONS.join(", ")
                )
                .into(),
            );
            Err(error)
        }
    }
}

/// Request body for creating or replacing an about-me entry
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct AboutMeRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub bio: String,
    pub profile_image: Option<String>,
    /// png, jpg, jpeg, gif, webp, svg or svgz
    #[validate(custom(function = "validate_logo_extension"))]
    pub logo_image: Option<String>,
    pub cv_file: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub years_of_experience: i32,
    #[validate(range(min = 0))]
    pub clients: Option<i32>,
}

impl AboutMeRequest {
    fn normalized(self) -> Self {
        Self {
            profile_image: blank_to_none(self.profile_image),
            logo_image: blank_to_none(self.logo_image),
            cv_file: blank_to_none(self.cv_file),
            ..self
        }
    }

    fn apply(self, active: &mut about_me::ActiveModel) {
        active.name = Set(self.name);
        active.title = Set(self.title);
        active.bio = Set(self.bio);
        active.profile_image = Set(self.profile_image);
        active.logo_image = Set(self.logo_image);
        active.cv_file = Set(self.cv_file);
        active.years_of_experience = Set(self.years_of_experience);
        active.clients = Set(self.clients);
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct AboutMePatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub profile_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub logo_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub cv_file: Option<Option<String>>,
    pub years_of_experience: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub clients: Option<Option<i32>>,
}

impl AboutMePatch {
    fn merge(self, current: &about_me::Model) -> AboutMeRequest {
        AboutMeRequest {
            name: self.name.unwrap_or_else(|| current.name.clone()),
            title: self.title.unwrap_or_else(|| current.title.clone()),
            bio: self.bio.unwrap_or_else(|| current.bio.clone()),
            profile_image: self
                .profile_image
                .unwrap_or_else(|| current.profile_image.clone()),
            logo_image: self
                .logo_image
                .unwrap_or_else(|| current.logo_image.clone()),
            cv_file: self.cv_file.unwrap_or_else(|| current.cv_file.clone()),
            years_of_experience: self
                .years_of_experience
                .unwrap_or(current.years_of_experience),
            clients: self.clients.unwrap_or(current.clients),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct AboutMeResponse {
    pub id: i32,
    pub user: Option<i32>,
    pub name: String,
    pub title: String,
    pub bio: String,
    pub profile_image: Option<String>,
    pub logo_image: Option<String>,
    pub cv_file: Option<String>,
    pub years_of_experience: i32,
    pub clients: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AboutMeResponse {
    pub fn new(model: about_me::Model, media: &MediaUrls) -> Self {
        Self {
            id: model.id,
            user: model.user_id,
            profile_image: media.optional(model.profile_image.as_deref()),
            logo_image: media.optional(model.logo_image.as_deref()),
            cv_file: media.optional(model.cv_file.as_deref()),
            name: model.name,
            title: model.title,
            bio: model.bio,
            years_of_experience: model.years_of_experience,
            clients: model.clients,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// List about-me entries visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/about/",
    tag = "content",
    responses(
        (status = 200, description = "Entries retrieved", body = ApiResponse<Vec<AboutMeResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_about(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
) -> ApiResult<Json<ApiResponse<Vec<AboutMeResponse>>>> {
    let entries = content::list::<about_me::Entity, _>(&state.db, &Viewer::of(&user)).await?;
    debug!("Found {} about-me entries", entries.len());

    let data = entries
        .into_iter()
        .map(|model| AboutMeResponse::new(model, &media))
        .collect();
    Ok(Json(ApiResponse::ok(data, "About me entries retrieved successfully")))
}

/// Create an about-me entry owned by the caller
#[utoipa::path(
    post,
    path = "/api/v1/about/",
    tag = "content",
    request_body = AboutMeRequest,
    responses(
        (status = 201, description = "Entry created", body = ApiResponse<AboutMeResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_about(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    JsonBody(request): JsonBody<AboutMeRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AboutMeResponse>>)> {
    let request = request.normalized();
    request.validate()?;

    let mut active = about_me::ActiveModel {
        user_id: Set(Some(user.id)),
        ..Default::default()
    };
    request.apply(&mut active);
    let created = active.insert(&state.db).await?;
    info!("About me entry {} created", created.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            AboutMeResponse::new(created, &media),
            "About me entry created successfully",
        )),
    ))
}

/// Get one about-me entry
#[utoipa::path(
    get,
    path = "/api/v1/about/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "About me entry ID")),
    responses(
        (status = 200, description = "Entry retrieved", body = ApiResponse<AboutMeResponse>),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, about_id = id))]
pub async fn get_about(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<AboutMeResponse>>> {
    let model = content::find::<about_me::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    Ok(Json(ApiResponse::ok(
        AboutMeResponse::new(model, &media),
        "About me entry retrieved successfully",
    )))
}

/// Replace an about-me entry
#[utoipa::path(
    put,
    path = "/api/v1/about/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "About me entry ID")),
    request_body = AboutMeRequest,
    responses(
        (status = 200, description = "Entry updated", body = ApiResponse<AboutMeResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, about_id = id))]
pub async fn replace_about(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
    JsonBody(request): JsonBody<AboutMeRequest>,
) -> ApiResult<Json<ApiResponse<AboutMeResponse>>> {
    let current = content::find::<about_me::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    save(&state, current, request.normalized(), &media).await
}

/// Partially update an about-me entry
#[utoipa::path(
    patch,
    path = "/api/v1/about/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "About me entry ID")),
    request_body = AboutMePatch,
    responses(
        (status = 200, description = "Entry updated", body = ApiResponse<AboutMeResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, about_id = id))]
pub async fn update_about(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    media: MediaUrls,
    Path(id): Path<i32>,
    JsonBody(patch): JsonBody<AboutMePatch>,
) -> ApiResult<Json<ApiResponse<AboutMeResponse>>> {
    let current = content::find::<about_me::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    let request = patch.merge(&current).normalized();
    save(&state, current, request, &media).await
}

async fn save(
    state: &AppState,
    current: about_me::Model,
    request: AboutMeRequest,
    media: &MediaUrls,
) -> ApiResult<Json<ApiResponse<AboutMeResponse>>> {
    request.validate()?;

    let mut active = current.into_active_model();
    request.apply(&mut active);
    let updated = active.update(&state.db).await?;
    info!("About me entry {} updated", updated.id);

    Ok(Json(ApiResponse::ok(
        AboutMeResponse::new(updated, media),
        "About me entry updated successfully",
    )))
}

/// Delete an about-me entry
#[utoipa::path(
    delete,
    path = "/api/v1/about/{id}/",
    tag = "content",
    params(("id" = i32, Path, description = "About me entry ID")),
    responses(
        (status = 200, description = "Entry deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, about_id = id))]
pub async fn delete_about(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    content::delete::<about_me::Entity, _>(&state.db, &Viewer::of(&user), id).await?;
    info!("About me entry {} deleted", id);
    Ok(Json(ApiResponse::ok(
        Empty {},
        "About me entry deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_extensions() {
        assert!(validate_logo_extension("logos/brand.PNG").is_ok());
        assert!(validate_logo_extension("logos/brand.svgz").is_ok());
        assert!(validate_logo_extension("logos/brand.exe").is_err());
        assert!(validate_logo_extension("logos/brand").is_err());
    }

    #[test]
    fn test_request_rejects_bad_logo() {
        let request: AboutMeRequest = serde_json::from_str(
            r#"{"name": "Ann", "title": "Engineer", "logo_image": "brand.bmp"}"#,
        )
        .unwrap();
        assert_eq!(request.years_of_experience, 0);

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("logo_image"));
    }

    #[test]
    fn test_name_length_matches_column() {
        let request = |name: String| AboutMeRequest {
            name,
            title: "Engineer".to_string(),
            bio: String::new(),
            profile_image: None,
            logo_image: None,
            cv_file: None,
            years_of_experience: 0,
            clients: None,
        };

        assert!(request("a".repeat(150)).validate().is_ok());
        assert!(request("a".repeat(200)).validate().is_ok());

        let errors = request("a".repeat(201)).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }
}
