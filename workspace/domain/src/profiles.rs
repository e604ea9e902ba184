use model::entities::{profile, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use tracing::{debug, info};

use crate::publish::{self, PublishActor, PublishEvent};
use crate::{DomainError, Result, secrets, slug};

pub async fn find_for_user<C>(db: &C, user_id: i32) -> Result<Option<profile::Model>>
where
    C: ConnectionTrait,
{
    Ok(profile::Entity::find()
        .filter(profile::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Returns the user's profile, creating an unpublished, unverified one on first access.
pub async fn get_or_create<C>(db: &C, user: &user::Model) -> Result<profile::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_for_user(db, user.id).await? {
        return Ok(existing);
    }

    let slug = slug::unique_slug(db, &user.username, None).await?;
    debug!("Creating profile for user {} with slug '{}'", user.id, slug);

    let created = profile::ActiveModel {
        user_id: Set(user.id),
        username_slug: Set(Some(slug)),
        portfolio_published: Set(false),
        is_approved: Set(false),
        email_verified: Set(false),
        email_verification_token: Set(None),
        banner_image: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(created)
}

/// Creates the profile of a freshly registered account, carrying a new verification token.
pub async fn create_with_token<C>(db: &C, user: &user::Model) -> Result<profile::Model>
where
    C: ConnectionTrait,
{
    let slug = slug::unique_slug(db, &user.username, None).await?;

    let created = profile::ActiveModel {
        user_id: Set(user.id),
        username_slug: Set(Some(slug)),
        portfolio_published: Set(false),
        is_approved: Set(false),
        email_verified: Set(false),
        email_verification_token: Set(Some(secrets::url_safe_token())),
        banner_image: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(created)
}

/// Owner-editable profile fields. `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub username_slug: Option<String>,
    pub portfolio_published: Option<bool>,
    pub banner_image: Option<Option<String>>,
}

/// Applies `changes` inside a transaction and reports the publish event it caused, if any.
///
/// The event is only returned once the transaction has committed.
pub async fn update(
    db: &DatabaseConnection,
    user: &user::Model,
    changes: ProfileChanges,
    actor: PublishActor,
) -> Result<(profile::Model, Option<PublishEvent>)> {
    let txn = db.begin().await?;

    let current = get_or_create(&txn, user).await?;
    let was_published = current.portfolio_published;
    let profile_id = current.id;
    let mut active = current.into_active_model();

    if let Some(requested) = changes.username_slug {
        let requested = requested.trim();
        let new_slug = if requested.is_empty() {
            slug::unique_slug(&txn, &user.username, Some(profile_id)).await?
        } else {
            let candidate = slug::slugify(requested);
            if candidate.is_empty() {
                return Err(DomainError::field(
                    "username_slug",
                    "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
                ));
            }
            if slug::is_taken(&txn, &candidate, Some(profile_id)).await? {
                return Err(DomainError::field(
                    "username_slug",
                    "This slug is already taken.",
                ));
            }
            candidate
        };
        active.username_slug = Set(Some(new_slug));
    }

    if let Some(published) = changes.portfolio_published {
        active.portfolio_published = Set(published);
    }

    if let Some(banner) = changes.banner_image {
        active.banner_image = Set(banner);
    }

    let updated = active.update(&txn).await?;
    txn.commit().await?;

    let event = publish::transition(Some(was_published), updated.portfolio_published, actor);
    if let Some(event) = event {
        info!(
            "Portfolio of user {} changed publication state: {:?}",
            user.id, event
        );
    }

    Ok((updated, event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{insert_user, setup_db};

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = setup_db().await;
        let user = insert_user(&db, "dana", false, false).await;

        let first = get_or_create(&db, &user).await.unwrap();
        let second = get_or_create(&db, &user).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.username_slug.as_deref(), Some("dana"));
        assert!(!first.portfolio_published);
        assert!(!first.is_approved);
    }

    #[tokio::test]
    async fn test_publish_events() {
        let db = setup_db().await;
        let user = insert_user(&db, "erin", false, false).await;

        let publish = ProfileChanges {
            portfolio_published: Some(true),
            ..Default::default()
        };

        let (profile, event) = update(&db, &user, publish.clone(), PublishActor::Owner)
            .await
            .unwrap();
        assert!(profile.portfolio_published);
        assert_eq!(event, Some(PublishEvent::Published));

        let (_, event) = update(&db, &user, publish, PublishActor::Owner).await.unwrap();
        assert_eq!(event, None);

        let unpublish = ProfileChanges {
            portfolio_published: Some(false),
            ..Default::default()
        };
        let (_, event) = update(&db, &user, unpublish, PublishActor::Admin).await.unwrap();
        assert_eq!(event, Some(PublishEvent::Unpublished { by_admin: true }));
    }

    #[tokio::test]
    async fn test_slug_changes() {
        let db = setup_db().await;
        let frank = insert_user(&db, "frank", false, false).await;
        let gina = insert_user(&db, "gina", false, false).await;
        get_or_create(&db, &gina).await.unwrap();

        let (profile, _) = update(
            &db,
            &frank,
            ProfileChanges {
                username_slug: Some("Frank The Tank".to_string()),
                ..Default::default()
            },
            PublishActor::Owner,
        )
        .await
        .unwrap();
        assert_eq!(profile.username_slug.as_deref(), Some("frank-the-tank"));

        let taken = update(
            &db,
            &frank,
            ProfileChanges {
                username_slug: Some("gina".to_string()),
                ..Default::default()
            },
            PublishActor::Owner,
        )
        .await;
        assert!(matches!(taken, Err(DomainError::Validation(_))));

        let (profile, _) = update(
            &db,
            &frank,
            ProfileChanges {
                username_slug: Some("  ".to_string()),
                ..Default::default()
            },
            PublishActor::Owner,
        )
        .await
        .unwrap();
        assert_eq!(profile.username_slug.as_deref(), Some("frank"));
    }
}
