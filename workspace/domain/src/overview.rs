use model::entities::contact_message::{self, MessageStatus};
use model::entities::{about_me, education, experience, profile, project, skill, user};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

use crate::Result;
use crate::access::ensure_admin;
use crate::accounts::ADMIN_ONLY;

/// Site-wide counters for the staff dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemOverview {
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

async fn messages_with(db: &DatabaseConnection, status: MessageStatus) -> Result<u64> {
    Ok(contact_message::Entity::find()
        .filter(contact_message::Column::Status.eq(status))
        .count(db)
        .await?)
}

pub async fn system_overview(db: &DatabaseConnection, actor: &user::Model) -> Result<SystemOverview> {
    ensure_admin(actor, ADMIN_ONLY)?;

    Ok(SystemOverview {
        total_users: user::Entity::find().count(db).await?,
        active_users: user::Entity::find()
            .filter(user::Column::IsActive.eq(true))
            .count(db)
            .await?,
        approved_users: profile::Entity::find()
            .filter(profile::Column::IsApproved.eq(true))
            .count(db)
            .await?,
        pending_users: profile::Entity::find()
            .filter(profile::Column::IsApproved.eq(false))
            .count(db)
            .await?,
        staff_users: user::Entity::find()
            .filter(user::Column::IsStaff.eq(true))
            .count(db)
            .await?,
        superusers: user::Entity::find()
            .filter(user::Column::IsSuperuser.eq(true))
            .count(db)
            .await?,
        total_projects: project::Entity::find().count(db).await?,
        total_experiences: experience::Entity::find().count(db).await?,
        total_educations: education::Entity::find().count(db).await?,
        total_skills: skill::Entity::find().count(db).await?,
        total_about_me: about_me::Entity::find().count(db).await?,
        total_messages: contact_message::Entity::find().count(db).await?,
        new_messages: messages_with(db, MessageStatus::New).await?,
        read_messages: messages_with(db, MessageStatus::Read).await?,
        replied_messages: messages_with(db, MessageStatus::Replied).await?,
    })
}
