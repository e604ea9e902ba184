//! Public portfolio pages and the contact form behind them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use domain::messages;
use domain::portfolio::{self, PortfolioContent};
use model::entities::{profile, user};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult};
use crate::extractors::JsonBody;
use crate::handlers::about::AboutMeResponse;
use crate::handlers::contact_messages::{MessageRequest, MessageResponse};
use crate::handlers::education::EducationResponse;
use crate::handlers::experience::ExperienceResponse;
use crate::handlers::profile::ProfileResponse;
use crate::handlers::projects::ProjectResponse;
use crate::handlers::skills::SkillResponse;
use crate::handlers::social_media::SocialMediaResponse;
use crate::helpers::media::MediaUrls;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// The content sections of a portfolio, each in listing order
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct PortfolioSections {
    pub about_me: Option<AboutMeResponse>,
    pub projects: Vec<ProjectResponse>,
    pub experiences: Vec<ExperienceResponse>,
    pub educations: Vec<EducationResponse>,
    pub skills: Vec<SkillResponse>,
    pub social_media: Vec<SocialMediaResponse>,
}

impl PortfolioSections {
    pub fn new(content: PortfolioContent, media: &MediaUrls) -> Self {
        Self {
            about_me: content
                .about_me
                .map(|model| AboutMeResponse::new(model, media)),
            projects: content
                .projects
                .into_iter()
                .map(|model| ProjectResponse::new(model, media))
                .collect(),
            experiences: content
                .experiences
                .into_iter()
                .map(ExperienceResponse::from)
                .collect(),
            educations: content
                .educations
                .into_iter()
                .map(EducationResponse::from)
                .collect(),
            skills: content
                .skills
                .into_iter()
                .map(|model| SkillResponse::new(model, media))
                .collect(),
            social_media: content
                .social_media
                .into_iter()
                .map(|model| SocialMediaResponse::new(model, media))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PortfolioResponse {
    pub profile: ProfileResponse,
    #[serde(flatten)]
    pub sections: PortfolioSections,
}

/// 403 body for a portfolio that exists but is not published
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UnpublishedPortfolio {
    pub error: String,
    pub code: String,
    pub success: bool,
    pub username_slug: Option<String>,
    pub portfolio_published: bool,
}

enum Lookup {
    Published(user::Model, profile::Model),
    Unpublished(profile::Model),
}

async fn lookup(state: &AppState, slug: &str) -> ApiResult<Lookup> {
    let Some((owner, profile)) = portfolio::resolve_owner(&state.db, slug).await? else {
        warn!("Portfolio '{}' not found", slug);
        return Err(ApiError::NotFound(format!(
            "Portfolio not found for username: {}",
            slug
        )));
    };
    if profile.portfolio_published {
        Ok(Lookup::Published(owner, profile))
    } else {
        debug!("Portfolio '{}' is not published", slug);
        Ok(Lookup::Unpublished(profile))
    }
}

/// View a published portfolio
#[utoipa::path(
    get,
    path = "/api/v1/portfolio/{slug}/",
    tag = "portfolio",
    params(("slug" = String, Path, description = "Portfolio slug or username")),
    responses(
        (status = 200, description = "Portfolio retrieved", body = ApiResponse<PortfolioResponse>),
        (status = 403, description = "Portfolio not published", body = UnpublishedPortfolio),
        (status = 404, description = "Portfolio not found", body = ErrorResponse)
    )
)]
#[instrument(skip_all, fields(slug = %slug))]
pub async fn portfolio_by_slug(
    State(state): State<AppState>,
    media: MediaUrls,
    Path(slug): Path<String>,
) -> ApiResult<Response> {
    let (owner, profile) = match lookup(&state, &slug).await? {
        Lookup::Published(owner, profile) => (owner, profile),
        Lookup::Unpublished(profile) => {
            let body = UnpublishedPortfolio {
                error: "Portfolio is not published. Please publish it from your dashboard."
                    .to_string(),
                code: "permission_denied".to_string(),
                success: false,
                username_slug: profile.username_slug,
                portfolio_published: false,
            };
            return Ok((StatusCode::FORBIDDEN, Json(body)).into_response());
        }
    };

    let content = portfolio::load_content(&state.db, owner.id).await?;
    let response = PortfolioResponse {
        profile: ProfileResponse::new(profile, &owner, &media),
        sections: PortfolioSections::new(content, &media),
    };
    Ok(Json(ApiResponse::ok(response, "Portfolio retrieved successfully")).into_response())
}

/// Send a message to the owner of a published portfolio
#[utoipa::path(
    post,
    path = "/api/v1/auth/portfolio/{slug}/message/",
    tag = "portfolio",
    params(("slug" = String, Path, description = "Portfolio slug or username")),
    request_body = MessageRequest,
    responses(
        (status = 201, description = "Message stored", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Portfolio not published", body = ErrorResponse),
        (status = 404, description = "Portfolio not found", body = ErrorResponse)
    )
)]
#[instrument(skip_all, fields(slug = %slug))]
pub async fn create_message_for_user(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    JsonBody(request): JsonBody<MessageRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<MessageResponse>>)> {
    let Lookup::Published(owner, _) = lookup(&state, &slug).await? else {
        return Err(ApiError::Forbidden("Portfolio is not published.".to_string()));
    };

    let message = messages::create(&state.db, Some(owner.id), request.into_new_message()?).await?;
    info!("Message {} delivered to portfolio of user {}", message.id, owner.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            MessageResponse::new(message, Some(&owner)),
            "Message sent successfully",
        )),
    ))
}
