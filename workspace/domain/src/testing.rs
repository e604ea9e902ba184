//! Fixtures shared by the database-backed tests of this crate.

use migration::{Migrator, MigratorTrait};
use model::entities::{profile, user};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

use crate::password::hash_password;

pub const PASSWORD: &str = "s3cret-pass";

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Inserts an active account whose password is [`PASSWORD`].
pub async fn insert_user(
    db: &DatabaseConnection,
    username: &str,
    is_staff: bool,
    is_superuser: bool,
) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@example.com", username)),
        password_hash: Set(hash_password(PASSWORD).expect("hash")),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        is_staff: Set(is_staff),
        is_superuser: Set(is_superuser),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

/// Inserts an unverified, unapproved, unpublished profile.
pub async fn insert_profile(db: &DatabaseConnection, user_id: i32, slug: &str) -> profile::Model {
    profile::ActiveModel {
        user_id: Set(user_id),
        username_slug: Set(Some(slug.to_string())),
        portfolio_published: Set(false),
        is_approved: Set(false),
        email_verified: Set(false),
        email_verification_token: Set(None),
        banner_image: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert profile")
}
