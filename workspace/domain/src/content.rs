//! Owner-scoped access to the six portfolio content types.
//!
//! Non-admin viewers only ever see their own rows: a row owned by someone else behaves
//! exactly like a missing one.

use model::entities::{about_me, education, experience, project, skill, social_media};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PrimaryKeyTrait, QueryFilter, QueryOrder, Select,
};
use tracing::debug;

use crate::access::Viewer;
use crate::{DomainError, Result};

/// A content entity with a nullable `user_id` owner column.
pub trait OwnedContent: EntityTrait {
    /// Human-readable name used in "not found" messages.
    const LABEL: &'static str;

    fn owner_column() -> Self::Column;

    /// Applies the listing order of this content type.
    fn ordered(query: Select<Self>) -> Select<Self>;
}

impl OwnedContent for about_me::Entity {
    const LABEL: &'static str = "About me entry";

    fn owner_column() -> Self::Column {
        about_me::Column::UserId
    }

    fn ordered(query: Select<Self>) -> Select<Self> {
        query.order_by_asc(about_me::Column::Id)
    }
}

impl OwnedContent for project::Entity {
    const LABEL: &'static str = "Project";

    fn owner_column() -> Self::Column {
        project::Column::UserId
    }

    fn ordered(query: Select<Self>) -> Select<Self> {
        query
            .order_by_desc(project::Column::CreatedAt)
            .order_by_desc(project::Column::Id)
    }
}

impl OwnedContent for experience::Entity {
    const LABEL: &'static str = "Experience";

    fn owner_column() -> Self::Column {
        experience::Column::UserId
    }

    fn ordered(query: Select<Self>) -> Select<Self> {
        query
            .order_by_desc(experience::Column::StartDate)
            .order_by_desc(experience::Column::Id)
    }
}

impl OwnedContent for education::Entity {
    const LABEL: &'static str = "Education";

    fn owner_column() -> Self::Column {
        education::Column::UserId
    }

    fn ordered(query: Select<Self>) -> Select<Self> {
        query
            .order_by_desc(education::Column::StartYear)
            .order_by_desc(education::Column::Id)
    }
}

impl OwnedContent for skill::Entity {
    const LABEL: &'static str = "Skill";

    fn owner_column() -> Self::Column {
        skill::Column::UserId
    }

    fn ordered(query: Select<Self>) -> Select<Self> {
        query
            .order_by_asc(skill::Column::Name)
            .order_by_asc(skill::Column::Id)
    }
}

impl OwnedContent for social_media::Entity {
    const LABEL: &'static str = "Social media link";

    fn owner_column() -> Self::Column {
        social_media::Column::UserId
    }

    fn ordered(query: Select<Self>) -> Select<Self> {
        query
            .order_by_asc(social_media::Column::Platform)
            .order_by_asc(social_media::Column::Id)
    }
}

/// Every row the viewer may see, in listing order.
pub async fn list<E, C>(db: &C, viewer: &Viewer) -> Result<Vec<E::Model>>
where
    E: OwnedContent,
    C: ConnectionTrait,
{
    Ok(E::ordered(viewer.scope(E::find(), E::owner_column()))
        .all(db)
        .await?)
}

/// Rows owned by one account, in listing order.
pub async fn owned_by<E, C>(db: &C, user_id: i32) -> Result<Vec<E::Model>>
where
    E: OwnedContent,
    C: ConnectionTrait,
{
    Ok(E::ordered(E::find().filter(E::owner_column().eq(user_id)))
        .all(db)
        .await?)
}

pub async fn find<E, C>(db: &C, viewer: &Viewer, id: i32) -> Result<E::Model>
where
    E: OwnedContent,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    viewer
        .scope(E::find_by_id(id), E::owner_column())
        .one(db)
        .await?
        .ok_or_else(|| {
            debug!("{} {} not visible to user {}", E::LABEL, id, viewer.user_id);
            DomainError::NotFound(format!("{} not found.", E::LABEL))
        })
}

pub async fn delete<E, C>(db: &C, viewer: &Viewer, id: i32) -> Result<()>
where
    E: OwnedContent,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    find::<E, C>(db, viewer, id).await?;
    E::delete_by_id(id).exec(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_user, setup_db};
    use model::entities::skill::SkillLevel;
    use sea_orm::{ActiveModelTrait, Set};

    async fn insert_skill(db: &sea_orm::DatabaseConnection, owner: Option<i32>, name: &str) -> skill::Model {
        skill::ActiveModel {
            user_id: Set(owner),
            name: Set(name.to_string()),
            level: Set(SkillLevel::Intermediate),
            icon_image: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_owner_isolation() {
        let db = setup_db().await;
        let alice = insert_user(&db, "alice", false, false).await;
        let bob = insert_user(&db, "bob", false, false).await;
        let staff = insert_user(&db, "staff", true, false).await;

        let rust = insert_skill(&db, Some(alice.id), "Rust").await;
        let go = insert_skill(&db, Some(bob.id), "Go").await;
        insert_skill(&db, None, "Site").await;

        let as_alice = Viewer::of(&alice);
        let listed = list::<skill::Entity, _>(&db, &as_alice).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, rust.id);

        let hidden = find::<skill::Entity, _>(&db, &as_alice, go.id).await;
        assert!(matches!(hidden, Err(DomainError::NotFound(_))));

        let deleted = delete::<skill::Entity, _>(&db, &as_alice, go.id).await;
        assert!(matches!(deleted, Err(DomainError::NotFound(_))));
        assert!(find::<skill::Entity, _>(&db, &Viewer::of(&bob), go.id).await.is_ok());

        let everything = list::<skill::Entity, _>(&db, &Viewer::of(&staff)).await.unwrap();
        let names: Vec<_> = everything.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Go", "Rust", "Site"]);
    }
}
