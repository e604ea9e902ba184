//! SeaORM entities for the portfolio service.
//!
//! Every piece of portfolio content hangs off a `user` through a nullable `user_id`;
//! rows without an owner belong to the site itself.

pub mod about_me;
pub mod contact_info;
pub mod contact_message;
pub mod education;
pub mod experience;
pub mod profile;
pub mod project;
pub mod skill;
pub mod social_media;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::about_me::Entity as AboutMe;
    pub use super::contact_info::Entity as ContactInfo;
    pub use super::contact_message::Entity as ContactMessage;
    pub use super::education::Entity as Education;
    pub use super::experience::Entity as Experience;
    pub use super::profile::Entity as Profile;
    pub use super::project::Entity as Project;
    pub use super::skill::Entity as Skill;
    pub use super::social_media::Entity as SocialMedia;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn new_user(username: &str, email: &str) -> user::ActiveModel {
        user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set("not-a-real-hash".to_string()),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            is_staff: Set(false),
            is_superuser: Set(false),
            is_active: Set(true),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let alice = new_user("alice", "alice@example.com").insert(&db).await?;

        let profile = profile::ActiveModel {
            user_id: Set(alice.id),
            username_slug: Set(Some("alice".to_string())),
            portfolio_published: Set(false),
            is_approved: Set(false),
            email_verified: Set(false),
            email_verification_token: Set(Some("token".to_string())),
            banner_image: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        assert_eq!(profile.created_at, profile.updated_at);

        skill::ActiveModel {
            user_id: Set(Some(alice.id)),
            name: Set("Rust".to_string()),
            level: Set(skill::SkillLevel::Advanced),
            icon_image: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        experience::ActiveModel {
            user_id: Set(Some(alice.id)),
            role: Set("Engineer".to_string()),
            company: Set("Acme".to_string()),
            start_date: Set(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
            end_date: Set(None),
            description: Set("Built things".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        social_media::ActiveModel {
            user_id: Set(Some(alice.id)),
            platform: Set(social_media::Platform::Github),
            platform_name: Set("alice".to_string()),
            url: Set("https://github.com/alice".to_string()),
            icon_image: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let message = contact_message::ActiveModel {
            user_id: Set(Some(alice.id)),
            name: Set("Bob".to_string()),
            email: Set("bob@example.com".to_string()),
            message: Set("Hello".to_string()),
            status: Set(contact_message::MessageStatus::New),
            reply: Set(None),
            replied_at: Set(None),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        assert_eq!(message.status, contact_message::MessageStatus::New);

        let found = Profile::find()
            .filter(profile::Column::UsernameSlug.eq("alice"))
            .one(&db)
            .await?
            .expect("profile by slug");
        assert_eq!(found.user_id, alice.id);

        let owner = found.find_related(User).one(&db).await?.expect("owner");
        assert_eq!(owner.username, "alice");

        let inbox = alice.find_related(ContactMessage).all(&db).await?;
        assert_eq!(inbox.len(), 1);

        // Deleting the account removes everything it owns.
        alice.delete(&db).await?;
        assert_eq!(Profile::find().count(&db).await?, 0);
        assert_eq!(Skill::find().count(&db).await?, 0);
        assert_eq!(Experience::find().count(&db).await?, 0);
        assert_eq!(SocialMedia::find().count(&db).await?, 0);
        assert_eq!(ContactMessage::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_unique_username_and_email() -> Result<(), DbErr> {
        let db = setup_db().await?;

        new_user("carol", "carol@example.com").insert(&db).await?;

        let same_username = new_user("carol", "other@example.com").insert(&db).await;
        assert!(same_username.is_err());

        let same_email = new_user("carol2", "carol@example.com").insert(&db).await;
        assert!(same_email.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_contact_info_defaults() -> Result<(), DbErr> {
        let db = setup_db().await?;

        contact_info::ActiveModel {
            email: Set("hello@example.com".to_string()),
            phone: Set(None),
            location: Set(Some("Prague".to_string())),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let active = ContactInfo::find()
            .filter(contact_info::Column::IsActive.eq(true))
            .count(&db)
            .await?;
        assert_eq!(active, 1);

        Ok(())
    }
}
