use crate::handlers::{
    about, auth, contact_info, contact_messages, education, experience, health::health_check,
    portfolio, profile, projects, skills, social_media, users,
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let media_root = state.settings.media_root.clone();

    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication and account lifecycle
        .route("/api/v1/auth/login/", post(auth::login))
        .route("/api/v1/auth/refresh/", post(auth::refresh))
        .route("/api/v1/auth/register/", post(auth::register))
        .route("/api/v1/auth/verify-email/:token/", get(auth::verify_email))
        .route("/api/v1/auth/verify-email-otp/", get(auth::verify_email_query))
        .route(
            "/api/v1/auth/resend-verification-otp/",
            post(auth::resend_verification),
        )
        .route("/api/v1/auth/password-reset/", post(auth::password_reset_request))
        .route(
            "/api/v1/auth/password-reset/:token/",
            post(auth::password_reset_confirm),
        )
        // Own profile
        .route(
            "/api/v1/auth/profile/",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route("/api/v1/auth/me/", get(profile::current_user))
        // Staff administration
        .route("/api/v1/auth/users/", get(users::list_users))
        .route(
            "/api/v1/auth/users/:user_id/approval/",
            patch(users::update_approval),
        )
        .route("/api/v1/auth/users/:user_id/status/", patch(users::update_status))
        .route(
            "/api/v1/auth/users/:user_id/publish/",
            patch(users::update_publication),
        )
        .route(
            "/api/v1/auth/users/:user_id/profile/",
            get(users::user_profile_detail),
        )
        .route("/api/v1/auth/system/overview/", get(users::system_overview))
        // Public portfolio
        .route("/api/v1/portfolio/:slug/", get(portfolio::portfolio_by_slug))
        .route(
            "/api/v1/auth/portfolio/:slug/message/",
            post(portfolio::create_message_for_user),
        )
        // Portfolio content
        .route(
            "/api/v1/about/",
            get(about::list_about).post(about::create_about),
        )
        .route(
            "/api/v1/about/:id/",
            get(about::get_about)
                .put(about::replace_about)
                .patch(about::update_about)
                .delete(about::delete_about),
        )
        .route(
            "/api/v1/projects/",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/v1/projects/:id/",
            get(projects::get_project)
                .put(projects::replace_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/api/v1/experience/",
            get(experience::list_experiences).post(experience::create_experience),
        )
        .route(
            "/api/v1/experience/:id/",
            get(experience::get_experience)
                .put(experience::replace_experience)
                .patch(experience::update_experience)
                .delete(experience::delete_experience),
        )
        .route(
            "/api/v1/education/",
            get(education::list_educations).post(education::create_education),
        )
        .route(
            "/api/v1/education/:id/",
            get(education::get_education)
                .put(education::replace_education)
                .patch(education::update_education)
                .delete(education::delete_education),
        )
        .route(
            "/api/v1/skills/",
            get(skills::list_skills).post(skills::create_skill),
        )
        .route(
            "/api/v1/skills/:id/",
            get(skills::get_skill)
                .put(skills::replace_skill)
                .patch(skills::update_skill)
                .delete(skills::delete_skill),
        )
        .route(
            "/api/v1/social-media/",
            get(social_media::list_social_media).post(social_media::create_social_media),
        )
        .route(
            "/api/v1/social-media/:id/",
            get(social_media::get_social_media)
                .put(social_media::replace_social_media)
                .patch(social_media::update_social_media)
                .delete(social_media::delete_social_media),
        )
        // Contact details and messages
        .route(
            "/api/v1/contact-info/",
            get(contact_info::list_contact_info).post(contact_info::create_contact_info),
        )
        .route(
            "/api/v1/contact-info/:id/",
            get(contact_info::get_contact_info)
                .put(contact_info::replace_contact_info)
                .patch(contact_info::update_contact_info)
                .delete(contact_info::delete_contact_info),
        )
        .route(
            "/api/v1/contact-messages/",
            get(contact_messages::list_messages).post(contact_messages::create_message),
        )
        .route(
            "/api/v1/contact-messages/:id/",
            get(contact_messages::get_message)
                .patch(contact_messages::update_message)
                .delete(contact_messages::delete_message),
        )
        .route(
            "/api/v1/contact-messages/:id/mark_read/",
            post(contact_messages::mark_read),
        )
        .route(
            "/api/v1/contact-messages/:id/reply/",
            post(contact_messages::reply),
        )
        .route(
            "/api/v1/contact-messages/:id/archive/",
            post(contact_messages::archive),
        )
        // Uploaded media
        .nest_service("/media", ServeDir::new(media_root))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    with_metrics(router)
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Exposes Prometheus metrics at `/metrics`.
///
/// The recorder is process-global and can only be installed once, so test builds skip it.
#[cfg(not(test))]
fn with_metrics(router: Router<AppState>) -> Router<AppState> {
    use axum_prometheus::PrometheusMetricLayer;

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
    router
        .route("/metrics", get(move || async move { metric_handle.render() }))
        .layer(prometheus_layer)
}

#[cfg(test)]
fn with_metrics(router: Router<AppState>) -> Router<AppState> {
    router
}
