use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use domain::tokens::TokenIssuer;
use notify::Notifier;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::config::Settings;
use crate::handlers::{
    about, auth, contact_info, contact_messages, education, experience, health, portfolio,
    profile, projects, skills, social_media, users,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Signs and checks JWTs
    pub tokens: Arc<TokenIssuer>,
    /// Outbound email
    pub notifier: Notifier,
    pub settings: Arc<Settings>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("frontend_url", &self.settings.frontend_url)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// Field-level validation messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Body carrying nothing but a message
#[derive(Serialize, Deserialize, ToSchema)]
pub struct Empty {}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::refresh,
        auth::register,
        auth::verify_email,
        auth::verify_email_query,
        auth::resend_verification,
        auth::password_reset_request,
        auth::password_reset_confirm,
        profile::get_profile,
        profile::update_profile,
        profile::current_user,
        users::list_users,
        users::update_approval,
        users::update_status,
        users::update_publication,
        users::user_profile_detail,
        users::system_overview,
        portfolio::portfolio_by_slug,
        portfolio::create_message_for_user,
        about::list_about,
        about::create_about,
        about::get_about,
        about::replace_about,
        about::update_about,
        about::delete_about,
        projects::list_projects,
        projects::create_project,
        projects::get_project,
        projects::replace_project,
        projects::update_project,
        projects::delete_project,
        experience::list_experiences,
        experience::create_experience,
        experience::get_experience,
        experience::replace_experience,
        experience::update_experience,
        experience::delete_experience,
        education::list_educations,
        education::create_education,
        education::get_education,
        education::replace_education,
        education::update_education,
        education::delete_education,
        skills::list_skills,
        skills::create_skill,
        skills::get_skill,
        skills::replace_skill,
        skills::update_skill,
        skills::delete_skill,
        social_media::list_social_media,
        social_media::create_social_media,
        social_media::get_social_media,
        social_media::replace_social_media,
        social_media::update_social_media,
        social_media::delete_social_media,
        contact_info::list_contact_info,
        contact_info::create_contact_info,
        contact_info::get_contact_info,
        contact_info::replace_contact_info,
        contact_info::update_contact_info,
        contact_info::delete_contact_info,
        contact_messages::list_messages,
        contact_messages::create_message,
        contact_messages::get_message,
        contact_messages::update_message,
        contact_messages::delete_message,
        contact_messages::mark_read,
        contact_messages::reply,
        contact_messages::archive,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            Empty,
            auth::LoginRequest,
            auth::RefreshRequest,
            auth::RegisterRequest,
            auth::RegisterResponse,
            auth::EmailRequest,
            auth::PasswordResetConfirmRequest,
            auth::VerificationResponse,
            auth::TokenPairResponse,
            auth::AccessToken,
            profile::ProfileResponse,
            profile::ProfileUpdateRequest,
            profile::CurrentUserResponse,
            users::UserSummary,
            users::ProfileSummary,
            users::UserListItem,
            users::UserListResponse,
            users::ApprovalRequest,
            users::ApprovalResponse,
            users::StatusRequest,
            users::StatusResponse,
            users::PublicationRequest,
            users::UserProfileDetail,
            users::OverviewResponse,
            portfolio::PortfolioResponse,
            portfolio::UnpublishedPortfolio,
            portfolio::PortfolioSections,
            about::AboutMeRequest,
            about::AboutMePatch,
            about::AboutMeResponse,
            projects::ProjectRequest,
            projects::ProjectPatch,
            projects::ProjectResponse,
            experience::ExperienceRequest,
            experience::ExperiencePatch,
            experience::ExperienceResponse,
            education::EducationRequest,
            education::EducationPatch,
            education::EducationResponse,
            skills::SkillRequest,
            skills::SkillPatch,
            skills::SkillResponse,
            social_media::SocialMediaRequest,
            social_media::SocialMediaPatch,
            social_media::SocialMediaResponse,
            contact_info::ContactInfoRequest,
            contact_info::ContactInfoPatch,
            contact_info::ContactInfoResponse,
            contact_messages::MessageRequest,
            contact_messages::MessageStatusRequest,
            contact_messages::ReplyRequest,
            contact_messages::MessageResponse,
            contact_messages::MessageRecipient,
            contact_messages::ReplyResponse,
            model::entities::skill::SkillLevel,
            model::entities::social_media::Platform,
            model::entities::contact_message::MessageStatus,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login, registration, verification and password reset"),
        (name = "profile", description = "The signed-in user's profile"),
        (name = "users", description = "Staff administration of accounts"),
        (name = "portfolio", description = "Public portfolio pages"),
        (name = "content", description = "Owner-scoped portfolio content"),
        (name = "contact", description = "Contact details and messages"),
    ),
    info(
        title = "Portfy API",
        description = "Portfolio hosting API - accounts, portfolio content and contact messages",
        version = "0.1.0",
        contact(
            name = "Portfy Team",
            email = "contact@portfy.dev"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme used by authenticated endpoints.
struct BearerAuth;

impl utoipa::Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
