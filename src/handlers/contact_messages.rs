use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use domain::access::Viewer;
use domain::messages::{self, NewMessage};
use model::entities::contact_message::{self, MessageStatus};
use model::entities::user;
use sea_orm::ModelTrait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::ApiResult;
use crate::extractors::{AuthUser, JsonBody};
use crate::schemas::{ApiResponse, AppState, Empty, ErrorResponse};

/// What a visitor submits
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct MessageRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

impl MessageRequest {
    /// Trims the fields and checks them.
    pub fn into_new_message(self) -> ApiResult<NewMessage> {
        let request = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            message: self.message.trim().to_string(),
        };
        request.validate()?;
        Ok(NewMessage {
            name: request.name,
            email: request.email,
            message: request.message,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct MessageStatusRequest {
    /// `read` from `new`, or `archived` from anything
    pub status: MessageStatus,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReplyRequest {
    #[serde(default)]
    pub reply: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct MessageRecipient {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: i32,
    /// Portfolio owner the message was sent to; absent for the site inbox
    pub user: Option<MessageRecipient>,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: MessageStatus,
    pub reply: Option<String>,
    pub replied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageResponse {
    pub fn new(model: contact_message::Model, recipient: Option<&user::Model>) -> Self {
        Self {
            id: model.id,
            user: recipient.map(|owner| MessageRecipient {
                id: owner.id,
                username: owner.username.clone(),
            }),
            name: model.name,
            email: model.email,
            message: model.message,
            status: model.status,
            reply: model.reply,
            replied_at: model.replied_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReplyResponse {
    #[serde(flatten)]
    pub message: MessageResponse,
    /// `sent` or `failed`
    pub email_status: String,
    pub email_message: String,
}

async fn with_recipient(
    state: &AppState,
    model: contact_message::Model,
) -> ApiResult<MessageResponse> {
    let recipient = model.find_related(user::Entity).one(&state.db).await?;
    Ok(MessageResponse::new(model, recipient.as_ref()))
}

/// List messages: own inbox, or every message for staff
#[utoipa::path(
    get,
    path = "/api/v1/contact-messages/",
    tag = "contact",
    responses(
        (status = 200, description = "Messages retrieved", body = ApiResponse<Vec<MessageResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<MessageResponse>>>> {
    let rows = messages::list_visible(&state.db, &Viewer::of(&user)).await?;
    debug!("Found {} messages", rows.len());

    let data = rows
        .into_iter()
        .map(|(message, recipient)| MessageResponse::new(message, recipient.as_ref()))
        .collect();
    Ok(Json(ApiResponse::ok(data, "Messages retrieved successfully")))
}

/// Leave a message in the site inbox
#[utoipa::path(
    post,
    path = "/api/v1/contact-messages/",
    tag = "contact",
    request_body = MessageRequest,
    responses(
        (status = 201, description = "Message stored", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id))]
pub async fn create_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(request): JsonBody<MessageRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<MessageResponse>>)> {
    let created = messages::create(&state.db, None, request.into_new_message()?).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            MessageResponse::new(created, None),
            "Message sent successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/contact-messages/{id}/",
    tag = "contact",
    params(("id" = i32, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message retrieved", body = ApiResponse<MessageResponse>),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, message_id = id))]
pub async fn get_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let message = messages::find_managed(&state.db, &Viewer::of(&user), id).await?;
    Ok(Json(ApiResponse::ok(
        with_recipient(&state, message).await?,
        "Message retrieved successfully",
    )))
}

/// Move a message along its workflow
#[utoipa::path(
    patch,
    path = "/api/v1/contact-messages/{id}/",
    tag = "contact",
    params(("id" = i32, Path, description = "Message ID")),
    request_body = MessageStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Illegal transition", body = ErrorResponse),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, message_id = id))]
pub async fn update_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    JsonBody(request): JsonBody<MessageStatusRequest>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let message =
        messages::update_status(&state.db, &Viewer::of(&user), id, request.status).await?;
    info!("Message {} is now {:?}", message.id, message.status);

    Ok(Json(ApiResponse::ok(
        with_recipient(&state, message).await?,
        "Message updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/contact-messages/{id}/",
    tag = "contact",
    params(("id" = i32, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message deleted", body = ApiResponse<Empty>),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, message_id = id))]
pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<Empty>>> {
    messages::delete(&state.db, &Viewer::of(&user), id).await?;
    info!("Message {} deleted", id);
    Ok(Json(ApiResponse::ok(Empty {}, "Message deleted successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/contact-messages/{id}/mark_read/",
    tag = "contact",
    params(("id" = i32, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message marked as read", body = ApiResponse<MessageResponse>),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, message_id = id))]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let message = messages::mark_read(&state.db, &Viewer::of(&user), id).await?;
    Ok(Json(ApiResponse::ok(
        with_recipient(&state, message).await?,
        "Message marked as read",
    )))
}

/// Store a reply and email it to the sender
///
/// The reply is kept even when the email cannot be delivered; `email_status` says which.
#[utoipa::path(
    post,
    path = "/api/v1/contact-messages/{id}/reply/",
    tag = "contact",
    params(("id" = i32, Path, description = "Message ID")),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply stored", body = ApiResponse<ReplyResponse>),
        (status = 400, description = "Blank reply or archived message", body = ErrorResponse),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, message_id = id))]
pub async fn reply(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    JsonBody(request): JsonBody<ReplyRequest>,
) -> ApiResult<Json<ApiResponse<ReplyResponse>>> {
    let message = messages::reply(&state.db, &Viewer::of(&user), id, &request.reply).await?;

    let (email_status, email_message) = match state.notifier.send_contact_reply(&message).await {
        Ok(()) => {
            info!("Reply to message {} emailed", message.id);
            ("sent", "Email sent successfully".to_string())
        }
        Err(e) => {
            error!("Failed to send email reply for message {}: {}", message.id, e);
            ("failed", format!("Failed to send email: {}", e))
        }
    };

    Ok(Json(ApiResponse::ok(
        ReplyResponse {
            message: with_recipient(&state, message).await?,
            email_status: email_status.to_string(),
            email_message,
        },
        "Reply saved successfully",
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/contact-messages/{id}/archive/",
    tag = "contact",
    params(("id" = i32, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message archived", body = ApiResponse<MessageResponse>),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(user_id = user.id, message_id = id))]
pub async fn archive(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    let message = messages::archive(&state.db, &Viewer::of(&user), id).await?;
    Ok(Json(ApiResponse::ok(
        with_recipient(&state, message).await?,
        "Message archived",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_request_validation() {
        let blank: MessageRequest =
            serde_json::from_str(r#"{"name": "  ", "email": "nope"}"#).unwrap();
        assert!(blank.into_new_message().is_err());

        let ok = MessageRequest {
            name: " Visitor ".to_string(),
            email: "visitor@example.com".to_string(),
            message: "Hello".to_string(),
        }
        .into_new_message()
        .unwrap();
        assert_eq!(ok.name, "Visitor");
    }
}
