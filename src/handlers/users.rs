use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use domain::access::ensure_admin;
use domain::accounts;
use domain::overview;
use domain::pagination::PageRequest;
use domain::profiles::{self, ProfileChanges};
use domain::publish::PublishActor;
use domain::{messages, portfolio};
use model::entities::{profile, user};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ApiResult};
use crate::extractors::{AuthUser, JsonBody};
use crate::handlers::contact_messages::MessageResponse;
use crate::handlers::portfolio::PortfolioSections;
use crate::handlers::profile::{ProfileResponse, notify_publication};
use crate::helpers::media::MediaUrls;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Account fields visible to staff
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<&user::Model> for UserSummary {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username.clone(),
            email: model.email.clone(),
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            is_active: model.is_active,
            date_joined: model.date_joined,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProfileSummary {
    pub id: i32,
    pub is_approved: bool,
    pub email_verified: bool,
    pub portfolio_published: bool,
    pub username_slug: Option<String>,
}

impl From<profile::Model> for ProfileSummary {
    fn from(model: profile::Model) -> Self {
        Self {
            id: model.id,
            is_approved: model.is_approved,
            email_verified: model.email_verified,
            portfolio_published: model.portfolio_published,
            username_slug: model.username_slug,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UserListItem {
    #[serde(flatten)]
    pub user: UserSummary,
    pub profile: ProfileSummary,
}

/// One page of accounts
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UserListResponse {
    pub results: Vec<UserListItem>,
    pub total_users: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Raw paging parameters; malformed values fall back to defaults
#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number (default 1)
    pub page: Option<String>,
    /// One of 10, 30, 50, 70, 100 (default 30)
    pub page_size: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ApprovalRequest {
    pub is_approved: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ApprovalResponse {
    pub user_id: i32,
    pub username: String,
    pub is_approved: bool,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StatusRequest {
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct StatusResponse {
    pub user_id: i32,
    pub username: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PublicationRequest {
    pub portfolio_published: Option<bool>,
}

/// Everything stored for one account
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UserProfileDetail {
    #[serde(flatten)]
    pub user: UserSummary,
    pub profile: ProfileResponse,
    #[serde(flatten)]
    pub sections: PortfolioSections,
    /// Messages received, newest first
    pub messages: Vec<MessageResponse>,
}

/// Site-wide counters
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct OverviewResponse {
    pub total_users: u64,
    pub active_users: u64,
    pub approved_users: u64,
    pub pending_users: u64,
    pub staff_users: u64,
    pub superusers: u64,
    pub total_projects: u64,
    pub total_experiences: u64,
    pub total_educations: u64,
    pub total_skills: u64,
    pub total_about_me: u64,
    pub total_messages: u64,
    pub new_messages: u64,
    pub read_messages: u64,
    pub replied_messages: u64,
}

impl From<overview::SystemOverview> for OverviewResponse {
    fn from(counts: overview::SystemOverview) -> Self {
        Self {
            total_users: counts.total_users,
            active_users: counts.active_users,
            approved_users: counts.approved_users,
            pending_users: counts.pending_users,
            staff_users: counts.staff_users,
            superusers: counts.superusers,
            total_projects: counts.total_projects,
            total_experiences: counts.total_experiences,
            total_educations: counts.total_educations,
            total_skills: counts.total_skills,
            total_about_me: counts.total_about_me,
            total_messages: counts.total_messages,
            new_messages: counts.new_messages,
            read_messages: counts.read_messages,
            replied_messages: counts.replied_messages,
        }
    }
}

/// List all accounts (staff only)
#[utoipa::path(
    get,
    path = "/api/v1/auth/users/",
    tag = "users",
    params(PageQuery),
    responses(
        (status = 200, description = "Accounts retrieved", body = ApiResponse<UserListResponse>),
        (status = 400, description = "Unsupported page size", body = ErrorResponse),
        (status = 403, description = "Not staff", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = actor.id))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<UserListResponse>>> {
    trace!("Entering list_users function");
    ensure_admin(&actor, "You do not have permission to view all users.")?;
    let request = PageRequest::parse(query.page.as_deref(), query.page_size.as_deref())?;
    debug!("Listing users: page {}, size {}", request.page, request.page_size);

    let page = accounts::list_users(&state.db, &actor, request).await?;
    let window = page.window;
    let results: Vec<UserListItem> = page
        .users
        .into_iter()
        .map(|(account, profile)| UserListItem {
            user: UserSummary::from(&account),
            profile: ProfileSummary::from(profile),
        })
        .collect();

    info!("Returning {} of {} users", results.len(), window.total_items);
    Ok(Json(ApiResponse::ok(
        UserListResponse {
            results,
            total_users: window.total_items,
            page: window.page,
            page_size: window.page_size,
            total_pages: window.total_pages,
            has_next: window.has_next,
            has_previous: window.has_previous,
        },
        "Users retrieved successfully",
    )))
}

/// Approve or revoke an account (staff only)
#[utoipa::path(
    patch,
    path = "/api/v1/auth/users/{user_id}/approval/",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = ApprovalRequest,
    responses(
        (status = 200, description = "Approval updated", body = ApiResponse<ApprovalResponse>),
        (status = 400, description = "Staff target or missing field", body = ErrorResponse),
        (status = 403, description = "Not staff", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = actor.id, target = user_id))]
pub async fn update_approval(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(user_id): Path<i32>,
    JsonBody(request): JsonBody<ApprovalRequest>,
) -> ApiResult<Json<ApiResponse<ApprovalResponse>>> {
    let Some(is_approved) = request.is_approved else {
        let target = accounts::get_user(&state.db, &actor, user_id).await?;
        if target.is_admin() {
            return Err(ApiError::BadRequest(
                "Cannot modify approval status for staff or superuser accounts.".to_string(),
            ));
        }
        return Err(ApiError::BadRequest("is_approved field is required".to_string()));
    };

    let (target, _) = accounts::set_approval(&state.db, &actor, user_id, is_approved).await?;

    match state.notifier.send_approval(&target, is_approved).await {
        Ok(()) => info!("Approval email sent to user {}", target.id),
        Err(e) => error!("Failed to send approval email to user {}: {}", target.id, e),
    }

    let message = if is_approved {
        "User approved successfully."
    } else {
        "User revoked successfully."
    };
    Ok(Json(ApiResponse::ok(
        ApprovalResponse {
            user_id: target.id,
            username: target.username,
            is_approved,
        },
        message,
    )))
}

/// Activate or deactivate an account (staff only)
#[utoipa::path(
    patch,
    path = "/api/v1/auth/users/{user_id}/status/",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<StatusResponse>),
        (status = 400, description = "Own account or missing field", body = ErrorResponse),
        (status = 403, description = "Not staff", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = actor.id, target = user_id))]
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(user_id): Path<i32>,
    JsonBody(request): JsonBody<StatusRequest>,
) -> ApiResult<Json<ApiResponse<StatusResponse>>> {
    let Some(is_active) = request.is_active else {
        accounts::get_user(&state.db, &actor, user_id).await?;
        if user_id == actor.id {
            return Err(ApiError::BadRequest(
                "You cannot deactivate your own account.".to_string(),
            ));
        }
        return Err(ApiError::BadRequest("is_active field is required".to_string()));
    };

    let target = accounts::set_active(&state.db, &actor, user_id, is_active).await?;
    let message = if is_active {
        "User activated successfully."
    } else {
        "User deactivated successfully."
    };

    Ok(Json(ApiResponse::ok(
        StatusResponse {
            user_id: target.id,
            username: target.username,
            is_active,
        },
        message,
    )))
}

/// Publish or unpublish someone's portfolio (staff only)
#[utoipa::path(
    patch,
    path = "/api/v1/auth/users/{user_id}/publish/",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = PublicationRequest,
    responses(
        (status = 200, description = "Publication state updated", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 403, description = "Not staff", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = actor.id, target = user_id))]
pub async fn update_publication(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    media: MediaUrls,
    Path(user_id): Path<i32>,
    JsonBody(request): JsonBody<PublicationRequest>,
) -> ApiResult<Json<ApiResponse<ProfileResponse>>> {
    let target = accounts::get_user(&state.db, &actor, user_id).await?;
    let Some(published) = request.portfolio_published else {
        return Err(ApiError::BadRequest(
            "portfolio_published field is required".to_string(),
        ));
    };

    let changes = ProfileChanges {
        portfolio_published: Some(published),
        ..Default::default()
    };
    let (profile, event) = profiles::update(&state.db, &target, changes, PublishActor::Admin).await?;
    info!(
        "User {} set portfolio_published of user {} to {}",
        actor.id, target.id, published
    );
    notify_publication(&state, &target, &profile, event).await;

    Ok(Json(ApiResponse::ok(
        ProfileResponse::new(profile, &target, &media),
        "Portfolio publication updated successfully.",
    )))
}

/// Full record of one account (staff only)
#[utoipa::path(
    get,
    path = "/api/v1/auth/users/{user_id}/profile/",
    tag = "users",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account retrieved", body = ApiResponse<UserProfileDetail>),
        (status = 403, description = "Not staff", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = actor.id, target = user_id))]
pub async fn user_profile_detail(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    media: MediaUrls,
    Path(user_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<UserProfileDetail>>> {
    ensure_admin(&actor, "You do not have permission to view user profiles.")?;
    let target = accounts::get_user(&state.db, &actor, user_id)
        .await
        .inspect_err(|_| warn!("User {} not available for inspection", user_id))?;

    let profile = profiles::get_or_create(&state.db, &target).await?;
    let content = portfolio::load_content(&state.db, target.id).await?;
    let inbox = messages::list_for_recipient(&state.db, target.id).await?;

    Ok(Json(ApiResponse::ok(
        UserProfileDetail {
            user: UserSummary::from(&target),
            profile: ProfileResponse::new(profile, &target, &media),
            sections: PortfolioSections::new(content, &media),
            messages: inbox
                .into_iter()
                .map(|message| MessageResponse::new(message, Some(&target)))
                .collect(),
        },
        "User profile retrieved successfully",
    )))
}

/// Site-wide statistics (staff only)
#[utoipa::path(
    get,
    path = "/api/v1/auth/system/overview/",
    tag = "users",
    responses(
        (status = 200, description = "Counters retrieved", body = ApiResponse<OverviewResponse>),
        (status = 403, description = "Not staff", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = actor.id))]
pub async fn system_overview(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<Json<ApiResponse<OverviewResponse>>> {
    let counts = overview::system_overview(&state.db, &actor).await?;
    Ok(Json(ApiResponse::ok(
        OverviewResponse::from(counts),
        "System overview retrieved successfully",
    )))
}
