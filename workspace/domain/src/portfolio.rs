use model::entities::{
    about_me, education, experience, profile, project, skill, social_media, user,
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::debug;

use crate::content::{self, OwnedContent};
use crate::{Result, profiles};

/// Everything a portfolio page shows besides the profile itself.
#[derive(Debug, Clone, Default)]
pub struct PortfolioContent {
    pub about_me: Option<about_me::Model>,
    pub projects: Vec<project::Model>,
    pub experiences: Vec<experience::Model>,
    pub educations: Vec<education::Model>,
    pub skills: Vec<skill::Model>,
    pub social_media: Vec<social_media::Model>,
}

pub async fn load_content<C>(db: &C, user_id: i32) -> Result<PortfolioContent>
where
    C: ConnectionTrait,
{
    let about_me = about_me::Entity::ordered(
        about_me::Entity::find().filter(about_me::Column::UserId.eq(user_id)),
    )
    .one(db)
    .await?;

    Ok(PortfolioContent {
        about_me,
        projects: content::owned_by::<project::Entity, _>(db, user_id).await?,
        experiences: content::owned_by::<experience::Entity, _>(db, user_id).await?,
        educations: content::owned_by::<education::Entity, _>(db, user_id).await?,
        skills: content::owned_by::<skill::Entity, _>(db, user_id).await?,
        social_media: content::owned_by::<social_media::Entity, _>(db, user_id).await?,
    })
}

/// Finds the owner of a portfolio URL segment.
///
/// The segment is matched against profile slugs first and raw usernames second; a user
/// found by username gets a profile on the spot.
pub async fn resolve_owner<C>(db: &C, slug: &str) -> Result<Option<(user::Model, profile::Model)>>
where
    C: ConnectionTrait,
{
    let by_slug = profile::Entity::find()
        .filter(profile::Column::UsernameSlug.eq(slug))
        .find_also_related(user::Entity)
        .one(db)
        .await?;

    if let Some((profile, Some(owner))) = by_slug {
        return Ok(Some((owner, profile)));
    }

    let Some(owner) = user::Entity::find()
        .filter(user::Column::Username.eq(slug))
        .one(db)
        .await?
    else {
        debug!("No portfolio for '{}'", slug);
        return Ok(None);
    };

    let profile = profiles::get_or_create(db, &owner).await?;
    Ok(Some((owner, profile)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_profile, insert_user, setup_db};
    use chrono::NaiveDate;
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn test_resolve_by_slug_then_username() {
        let db = setup_db().await;
        let owner = insert_user(&db, "Helen", false, false).await;
        insert_profile(&db, owner.id, "helen-portfolio").await;
        let late = insert_user(&db, "ivan", false, false).await;

        let (found, _) = resolve_owner(&db, "helen-portfolio").await.unwrap().unwrap();
        assert_eq!(found.id, owner.id);

        let (found, _) = resolve_owner(&db, "Helen").await.unwrap().unwrap();
        assert_eq!(found.id, owner.id);

        let (found, profile) = resolve_owner(&db, "ivan").await.unwrap().unwrap();
        assert_eq!(found.id, late.id);
        assert_eq!(profile.username_slug.as_deref(), Some("ivan"));

        assert!(resolve_owner(&db, "nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_content_ordering() {
        let db = setup_db().await;
        let owner = insert_user(&db, "jane", false, false).await;

        for (role, year) in [("Junior", 2018), ("Senior", 2022), ("Mid", 2020)] {
            experience::ActiveModel {
                user_id: Set(Some(owner.id)),
                role: Set(role.to_string()),
                company: Set("Acme".to_string()),
                start_date: Set(NaiveDate::from_ymd_opt(year, 1, 1).unwrap()),
                end_date: Set(None),
                description: Set(String::new()),
                ..Default::default()
            }
            .insert(&db)
            .await
            .unwrap();
        }
        for name in ["Zig", "Ada"] {
            skill::ActiveModel {
                user_id: Set(Some(owner.id)),
                name: Set(name.to_string()),
                level: Set(skill::SkillLevel::Intermediate),
                icon_image: Set(None),
                ..Default::default()
            }
            .insert(&db)
            .await
            .unwrap();
        }

        let content = load_content(&db, owner.id).await.unwrap();
        let roles: Vec<_> = content.experiences.iter().map(|e| e.role.as_str()).collect();
        assert_eq!(roles, vec!["Senior", "Mid", "Junior"]);
        let skills: Vec<_> = content.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skills, vec!["Ada", "Zig"]);
        assert!(content.about_me.is_none());
    }
}
