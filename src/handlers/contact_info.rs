use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use domain::access::ensure_admin;
use model::entities::{contact_info, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AuthUser, JsonBody, MaybeAuthUser};
use crate::helpers::patch::{blank_to_none, double_option};
use crate::schemas::{ApiResponse, AppState, Empty, ErrorResponse};

const STAFF_ONLY: &str = "You do not have permission to perform this action.";

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct ContactInfoRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    /// Inactive rows are hidden from anonymous visitors
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ContactInfoRequest {
    fn apply(self, active: &mut contact_info::ActiveModel) {
        active.email = Set(self.email);
        active.phone = Set(blank_to_none(self.phone));
        active.location = Set(blank_to_none(self.location));
        active.is_active = Set(self.is_active);
    }
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct ContactInfoPatch {
    pub email: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl ContactInfoPatch {
    fn merge(self, current: &contact_info::Model) -> ContactInfoRequest {
        ContactInfoRequest {
            email: self.email.unwrap_or_else(|| current.email.clone()),
            phone: self.phone.unwrap_or_else(|| current.phone.clone()),
            location: self.location.unwrap_or_else(|| current.location.clone()),
            is_active: self.is_active.unwrap_or(current.is_active),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ContactInfoResponse {
    pub id: i32,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<contact_info::Model> for ContactInfoResponse {
    fn from(model: contact_info::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            phone: model.phone,
            location: model.location,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Loads a row the caller may read. Anonymous callers only see active rows.
async fn find_visible(
    state: &AppState,
    viewer: Option<&user::Model>,
    id: i32,
) -> ApiResult<contact_info::Model> {
    let mut query = contact_info::Entity::find_by_id(id);
    if viewer.is_none() {
        query = query.filter(contact_info::Column::IsActive.eq(true));
    }
    query.one(&state.db).await?.ok_or_else(|| {
        warn!("Contact info {} not found", id);
        ApiError::NotFound("Contact info not found.".to_string())
    })
}

/// List site contact details; active rows first, newest first
#[utoipa::path(
    get,
    path = "/api/v1/contact-info/",
    tag = "contact",
    responses(
        (status = 200, description = "Contact details retrieved", body = ApiResponse<Vec<ContactInfoResponse>>)
    )
)]
#[instrument(skip_all)]
pub async fn list_contact_info(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
) -> ApiResult<Json<ApiResponse<Vec<ContactInfoResponse>>>> {
    let mut query = contact_info::Entity::find()
        .order_by_desc(contact_info::Column::IsActive)
        .order_by_desc(contact_info::Column::CreatedAt)
        .order_by_desc(contact_info::Column::Id);
    if viewer.is_none() {
        query = query.filter(contact_info::Column::IsActive.eq(true));
    }

    let rows = query.all(&state.db).await?;
    debug!("Found {} contact info rows", rows.len());

    let data = rows.into_iter().map(ContactInfoResponse::from).collect();
    Ok(Json(ApiResponse::ok(data, "Contact info retrieved successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/contact-info/",
    tag = "contact",
    request_body = ContactInfoRequest,
    responses(
        (status = 201, description = "Contact details created", body = ApiResponse<ContactInfoResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not staff", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_contact_info(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(request): JsonBody<ContactInfoRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ContactInfoResponse>>)> {
    ensure_admin(&user, STAFF_ONLY)?;
    request.validate()?;

    let mut active = <contact_info::ActiveModel as Default>::default();
    request.apply(&mut active);
    let created = active.insert(&state.db).await?;
    info!("Contact info {} created", created.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            ContactInfoResponse::from(created),
            "Contact info created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/contact-info/{id}/",
    tag = "contact",
    params(("id" = i32, Path, description = "Contact info ID")),
    responses(
        (status = 200, description = "Contact details retrieved", body = ApiResponse<ContactInfoResponse>),
        (status = 404, description = "Not found or inactive", body = ErrorResponse)
    )
)]
#[instrument(skip_all, fields(contact_info_id = id))]
pub async fn get_contact_info(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<ContactInfoResponse>>> {
    let row = find_visible(&state, viewer.as_ref(), id).await?;
    Ok(Json(ApiResponse::ok(
        ContactInfoResponse::from(row),
        "Contact info retrieved successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/contact-info/{id}/",
    tag = "contact",
    params(("id" = i32, Path, description = "Contact info ID")),
    request_body = ContactInfoRequest,
    responses(
        (status = 200, description = "Contact details updated", body = ApiResponse<ContactInfoResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not staff", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, contact_info_id = id))]
pub async fn replace_contact_info(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    JsonBody(request): JsonBody<ContactInfoRequest>,
) -> ApiResult<Json<ApiResponse<ContactInfoResponse>>> {
    ensure_admin(&user, STAFF_ONLY)?;
    let current = find_visible(&state, Some(&user), id).await?;
    save(&state, current, request).await
}

#[utoipa::path(
    patch,
    path = "/api/v1/contact-info/{id}/",
    tag = "contact",
    params(("id" = i32, Path, description = "Contact info ID")),
    request_body = ContactInfoPatch,
    responses(
        (status = 200, description = "Contact details updated", body = ApiResponse<ContactInfoResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Not staff", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, contact_info_id = id))]
pub async fn update_contact_info(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    JsonBody(patch): JsonBody<ContactInfoPatch>,
) -> ApiResult<Json<ApiResponse<ContactInfoResponse>>> {
    ensure_admin(&user, STAFF_ONLY)?;
    let current = find_visible(&state, Some(&user), id).await?;
    let request = patch.merge(&current);
    save(&state, current, request).await
}

async fn save(
    state: &AppState,
    current: contact_info::Model,
    request: ContactInfoRequest,
) -> ApiResult<Json<ApiResponse<ContactInfoResponse>>> {
    request.validate()?;

    let mut active = current.into_active_model();
    request.apply(&mut active);
    let updated = active.update(&state.db).await?;
    info!("Contact info {} updated", updated.id);

    Ok(Json(ApiResponse::ok(
        ContactInfoResponse::from(updated),
        "Contact info updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/contact-info/{id}/",
    tag = "contact",
    params(("id" = i32, Path, description = "Contact info ID")),
    responses(
        (status = 200, description = "Contact details deleted", body = ApiResponse<Empty>),
        (status = 403, description = "Not staff", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, contact_info_id = id))]
pub async fn delete_contact_info(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    ensure_admin(&user, STAFF_ONLY)?;
    let row = find_visible(&state, Some(&user), id).await?;
    row.delete(&state.db).await?;
    info!("Contact info {} deleted", id);
    Ok(Json(ApiResponse::ok(Empty {}, "Contact info deleted successfully")))
}
