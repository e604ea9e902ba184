//! Contact-message inbox workflow.
//!
//! Status only moves forward (`new → read → replied`), except that any message can be
//! archived. Reply text is only ever written by [`reply`].

use chrono::Utc;
use model::entities::contact_message::{self, MessageStatus};
use model::entities::user;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::access::Viewer;
use crate::{DomainError, Result};

/// An inbox action requested by the recipient or staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAction {
    MarkRead,
    Reply,
    Archive,
}

fn rank(status: MessageStatus) -> u8 {
    match status {
        MessageStatus::New => 0,
        MessageStatus::Read => 1,
        MessageStatus::Replied => 2,
        MessageStatus::Archived => 3,
    }
}

/// Status after applying `action` to a message currently in `current`.
pub fn next_status(current: MessageStatus, action: MessageAction) -> Result<MessageStatus> {
    match action {
        MessageAction::MarkRead => Ok(if current == MessageStatus::New {
            MessageStatus::Read
        } else {
            current
        }),
        MessageAction::Reply => {
            if current == MessageStatus::Archived {
                Err(DomainError::Rejected(
                    "Archived messages cannot be replied to.".to_string(),
                ))
            } else {
                Ok(MessageStatus::Replied)
            }
        }
        MessageAction::Archive => Ok(MessageStatus::Archived),
    }
}

/// Validates a direct status edit. `replied` is reserved for the reply action.
pub fn check_status_change(current: MessageStatus, requested: MessageStatus) -> Result<MessageStatus> {
    if requested == current {
        return Ok(current);
    }
    match requested {
        MessageStatus::Archived => Ok(requested),
        MessageStatus::Replied => Err(DomainError::field(
            "status",
            "Use the reply action to reply to a message.",
        )),
        _ if current != MessageStatus::Archived && rank(requested) > rank(current) => Ok(requested),
        _ => Err(DomainError::field(
            "status",
            format!(
                "Cannot change status from {} to {}.",
                current.to_value(),
                requested.to_value()
            ),
        )),
    }
}

/// Sender-supplied content of a new message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Stores a message addressed to `recipient` (or to the site when `None`) with status `new`.
pub async fn create<C>(db: &C, recipient: Option<i32>, new: NewMessage) -> Result<contact_message::Model>
where
    C: ConnectionTrait,
{
    let created = contact_message::ActiveModel {
        user_id: Set(recipient),
        name: Set(new.name),
        email: Set(new.email),
        message: Set(new.message),
        status: Set(MessageStatus::New),
        reply: Set(None),
        replied_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Contact message {} stored for recipient {:?}", created.id, recipient);
    Ok(created)
}

/// Messages visible to `viewer`, newest first, each with its recipient.
pub async fn list_visible(
    db: &DatabaseConnection,
    viewer: &Viewer,
) -> Result<Vec<(contact_message::Model, Option<user::Model>)>> {
    Ok(viewer
        .scope(contact_message::Entity::find(), contact_message::Column::UserId)
        .find_also_related(user::Entity)
        .order_by_desc(contact_message::Column::CreatedAt)
        .order_by_desc(contact_message::Column::Id)
        .all(db)
        .await?)
}

/// Messages received by one account, newest first.
pub async fn list_for_recipient<C>(db: &C, user_id: i32) -> Result<Vec<contact_message::Model>>
where
    C: ConnectionTrait,
{
    Ok(contact_message::Entity::find()
        .filter(contact_message::Column::UserId.eq(user_id))
        .order_by_desc(contact_message::Column::CreatedAt)
        .order_by_desc(contact_message::Column::Id)
        .all(db)
        .await?)
}

/// Loads a message the viewer may see, then re-checks that they may act on it.
pub async fn find_managed(
    db: &DatabaseConnection,
    viewer: &Viewer,
    id: i32,
) -> Result<contact_message::Model> {
    let message = viewer
        .scope(contact_message::Entity::find_by_id(id), contact_message::Column::UserId)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound("Message not found.".to_string()))?;
    viewer.ensure_can_manage(message.user_id)?;
    Ok(message)
}

pub async fn mark_read(
    db: &DatabaseConnection,
    viewer: &Viewer,
    id: i32,
) -> Result<contact_message::Model> {
    let message = find_managed(db, viewer, id).await?;
    let status = next_status(message.status, MessageAction::MarkRead)?;
    if status == message.status {
        return Ok(message);
    }

    let mut active = message.into_active_model();
    active.status = Set(status);
    Ok(active.update(db).await?)
}

pub async fn archive(
    db: &DatabaseConnection,
    viewer: &Viewer,
    id: i32,
) -> Result<contact_message::Model> {
    let message = find_managed(db, viewer, id).await?;
    let status = next_status(message.status, MessageAction::Archive)?;

    let mut active = message.into_active_model();
    active.status = Set(status);
    Ok(active.update(db).await?)
}

/// Records the reply. Emailing it to the sender is the caller's job.
pub async fn reply(
    db: &DatabaseConnection,
    viewer: &Viewer,
    id: i32,
    text: &str,
) -> Result<contact_message::Model> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::Rejected("Reply text is required".to_string()));
    }

    let message = find_managed(db, viewer, id).await?;
    let status = next_status(message.status, MessageAction::Reply)?;

    let mut active = message.into_active_model();
    active.reply = Set(Some(text.to_string()));
    active.status = Set(status);
    active.replied_at = Set(Some(Utc::now()));
    let updated = active.update(db).await?;

    info!("Message {} replied by user {}", updated.id, viewer.user_id);
    Ok(updated)
}

pub async fn update_status(
    db: &DatabaseConnection,
    viewer: &Viewer,
    id: i32,
    requested: MessageStatus,
) -> Result<contact_message::Model> {
    let message = find_managed(db, viewer, id).await?;
    let status = check_status_change(message.status, requested)?;
    if status == message.status {
        return Ok(message);
    }

    let mut active = message.into_active_model();
    active.status = Set(status);
    Ok(active.update(db).await?)
}

pub async fn delete(db: &DatabaseConnection, viewer: &Viewer, id: i32) -> Result<()> {
    let message = find_managed(db, viewer, id).await?;
    message.delete(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_user, setup_db};

    fn hello() -> NewMessage {
        NewMessage {
            name: "Visitor".to_string(),
            email: "visitor@example.com".to_string(),
            message: "Hello there".to_string(),
        }
    }

    #[test]
    fn test_actions() {
        use MessageStatus::*;

        assert_eq!(next_status(New, MessageAction::MarkRead).unwrap(), Read);
        assert_eq!(next_status(Replied, MessageAction::MarkRead).unwrap(), Replied);
        assert_eq!(next_status(Archived, MessageAction::MarkRead).unwrap(), Archived);

        assert_eq!(next_status(New, MessageAction::Reply).unwrap(), Replied);
        assert_eq!(next_status(Replied, MessageAction::Reply).unwrap(), Replied);
        assert!(next_status(Archived, MessageAction::Reply).is_err());

        for status in [New, Read, Replied, Archived] {
            assert_eq!(next_status(status, MessageAction::Archive).unwrap(), Archived);
        }
    }

    #[test]
    fn test_direct_status_changes() {
        use MessageStatus::*;

        assert_eq!(check_status_change(New, Read).unwrap(), Read);
        assert_eq!(check_status_change(Read, Read).unwrap(), Read);
        assert_eq!(check_status_change(Replied, Archived).unwrap(), Archived);
        assert!(check_status_change(Read, New).is_err());
        assert!(check_status_change(Archived, Read).is_err());
        assert!(check_status_change(New, Replied).is_err());
    }

    #[tokio::test]
    async fn test_inbox_is_private() {
        let db = setup_db().await;
        let alice = insert_user(&db, "alice", false, false).await;
        let mallory = insert_user(&db, "mallory", false, false).await;
        let staff = insert_user(&db, "staff", true, false).await;

        let message = create(&db, Some(alice.id), hello()).await.unwrap();
        create(&db, None, hello()).await.unwrap();

        let intruder = Viewer::of(&mallory);
        assert!(list_visible(&db, &intruder).await.unwrap().is_empty());
        assert!(matches!(
            mark_read(&db, &intruder, message.id).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(reply(&db, &intruder, message.id, "hi").await.is_err());
        assert!(delete(&db, &intruder, message.id).await.is_err());

        let inbox = list_visible(&db, &Viewer::of(&alice)).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].1.as_ref().map(|u| u.id), Some(alice.id));

        assert_eq!(list_visible(&db, &Viewer::of(&staff)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reply_and_archive() {
        let db = setup_db().await;
        let alice = insert_user(&db, "alice", false, false).await;
        let viewer = Viewer::of(&alice);
        let message = create(&db, Some(alice.id), hello()).await.unwrap();

        assert!(matches!(
            reply(&db, &viewer, message.id, "   ").await,
            Err(DomainError::Rejected(_))
        ));

        let read = mark_read(&db, &viewer, message.id).await.unwrap();
        assert_eq!(read.status, MessageStatus::Read);

        let replied = reply(&db, &viewer, message.id, "Thanks!").await.unwrap();
        assert_eq!(replied.status, MessageStatus::Replied);
        assert_eq!(replied.reply.as_deref(), Some("Thanks!"));
        assert!(replied.replied_at.is_some());

        let still_replied = mark_read(&db, &viewer, message.id).await.unwrap();
        assert_eq!(still_replied.status, MessageStatus::Replied);

        let archived = archive(&db, &viewer, message.id).await.unwrap();
        assert_eq!(archived.status, MessageStatus::Archived);
        assert!(reply(&db, &viewer, message.id, "Again").await.is_err());

        assert_eq!(list_for_recipient(&db, alice.id).await.unwrap().len(), 1);
    }
}
