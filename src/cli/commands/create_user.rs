use anyhow::{Context, Result};
use domain::accounts::{self, NewAccount};
use sea_orm::Database;
use tracing::{debug, error, info};

pub async fn create_user(database_url: &str, account: NewAccount) -> Result<()> {
    debug!("Database URL: {}", database_url);
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    let username = account.username.clone();
    let user = accounts::create_account(&db, account).await.map_err(|e| {
        error!("Failed to create user '{}': {}", username, e);
        anyhow::Error::new(e)
    })?;

    info!(
        "User '{}' created with id {} (staff: {}, superuser: {})",
        user.username, user.id, user.is_staff, user.is_superuser
    );
    Ok(())
}
