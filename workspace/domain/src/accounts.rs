//! Account lifecycle: registration, login, email verification, password reset and the
//! staff-only approval and activation switches.

use model::entities::{profile, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use crate::access::ensure_admin;
use crate::pagination::{PageRequest, PageWindow};
use crate::password::{hash_password, verify_password};
use crate::{AuthFailure, DomainError, FieldErrors, Result, profiles, secrets};

pub const ADMIN_ONLY: &str = "You do not have permission to perform this action.";

/// Input of a self-service sign-up, already shape-validated by the caller.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Accounts created from the command line skip verification and approval.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Creates the account and its profile in one transaction.
///
/// The returned profile carries the verification token to mail out.
pub async fn register(
    db: &DatabaseConnection,
    registration: Registration,
) -> Result<(user::Model, profile::Model)> {
    let mut errors = FieldErrors::new();
    if email_exists(db, &registration.email).await? {
        errors
            .entry("email".to_string())
            .or_default()
            .push("A user with this email already exists.".to_string());
    }
    if username_exists(db, &registration.username).await? {
        errors
            .entry("username".to_string())
            .or_default()
            .push("A user with this username already exists.".to_string());
    }
    if !errors.is_empty() {
        return Err(DomainError::Validation(errors));
    }

    let password_hash = hash_password(&registration.password)?;

    let txn = db.begin().await?;
    let user = user::ActiveModel {
        username: Set(registration.username),
        email: Set(registration.email),
        password_hash: Set(password_hash),
        first_name: Set(registration.first_name),
        last_name: Set(registration.last_name),
        is_staff: Set(false),
        is_superuser: Set(false),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let profile = profiles::create_with_token(&txn, &user).await?;
    txn.commit().await?;

    info!("Registered user {} ({})", user.id, user.username);
    Ok((user, profile))
}

/// Creates a ready-to-use account: verified, approved and active.
pub async fn create_account(db: &DatabaseConnection, account: NewAccount) -> Result<user::Model> {
    if email_exists(db, &account.email).await? {
        return Err(DomainError::field(
            "email",
            "A user with this email already exists.",
        ));
    }
    if username_exists(db, &account.username).await? {
        return Err(DomainError::field(
            "username",
            "A user with this username already exists.",
        ));
    }

    let password_hash = hash_password(&account.password)?;

    let txn = db.begin().await?;
    let user = user::ActiveModel {
        username: Set(account.username),
        email: Set(account.email),
        password_hash: Set(password_hash),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        is_staff: Set(account.is_staff),
        is_superuser: Set(account.is_superuser),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut profile = profiles::get_or_create(&txn, &user).await?.into_active_model();
    profile.email_verified = Set(true);
    profile.is_approved = Set(true);
    profile.update(&txn).await?;
    txn.commit().await?;

    info!("Created account {} ({})", user.id, user.username);
    Ok(user)
}

async fn email_exists<C: ConnectionTrait>(db: &C, email: &str) -> Result<bool> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .count(db)
        .await?
        > 0)
}

async fn username_exists<C: ConnectionTrait>(db: &C, username: &str) -> Result<bool> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .count(db)
        .await?
        > 0)
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<user::Model>> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?)
}

/// Resolves a login identifier and applies the account-state gates in order:
/// credentials and activity, email verification (skipped for superusers), approval
/// (skipped for staff and superusers).
pub async fn authenticate<C>(db: &C, username_or_email: &str, password: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let identifier = username_or_email.trim();
    if identifier.is_empty() || password.is_empty() {
        return Err(DomainError::Authentication(AuthFailure::MissingCredentials));
    }

    let account = if identifier.contains('@') {
        find_by_email(db, identifier).await?
    } else {
        user::Entity::find()
            .filter(user::Column::Username.eq(identifier))
            .one(db)
            .await?
    };

    let Some(account) = account else {
        debug!("Login failed: no account for identifier");
        return Err(DomainError::Authentication(AuthFailure::InvalidCredentials));
    };

    if !verify_password(password, &account.password_hash) || !account.is_active {
        debug!("Login failed for user {}: bad password or inactive", account.id);
        return Err(DomainError::Authentication(AuthFailure::InvalidCredentials));
    }

    if account.is_superuser {
        return Ok(account);
    }

    let Some(profile) = profiles::find_for_user(db, account.id).await? else {
        warn!("User {} has no profile", account.id);
        return Err(DomainError::Authentication(AuthFailure::AccountNotSetUp));
    };

    if !profile.email_verified {
        return Err(DomainError::Authentication(AuthFailure::EmailNotVerified));
    }

    if !account.is_staff && !profile.is_approved {
        return Err(DomainError::Authentication(AuthFailure::PendingApproval));
    }

    Ok(account)
}

/// Outcome of following a verification link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    AlreadyVerified,
    /// No profile holds the token. Either it was consumed already or it never existed;
    /// the two cases cannot be told apart.
    UnknownToken,
}

pub async fn verify_email(db: &DatabaseConnection, token: &str) -> Result<VerificationOutcome> {
    if secrets::is_blank_token(token) {
        return Err(DomainError::Rejected(
            "Invalid or expired verification token.".to_string(),
        ));
    }

    let Some(profile) = find_by_token(db, token).await? else {
        return Ok(VerificationOutcome::UnknownToken);
    };

    if profile.email_verified {
        return Ok(VerificationOutcome::AlreadyVerified);
    }

    let user_id = profile.user_id;
    let mut active = profile.into_active_model();
    active.email_verified = Set(true);
    active.email_verification_token = Set(None);
    active.update(db).await?;

    info!("Email verified for user {}", user_id);
    Ok(VerificationOutcome::Verified)
}

/// Issues a fresh verification token when `email` belongs to an unverified account.
pub async fn reissue_verification(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<(user::Model, String)>> {
    let Some(user) = find_by_email(db, email).await? else {
        return Ok(None);
    };

    let profile = profiles::get_or_create(db, &user).await?;
    if profile.email_verified {
        return Ok(None);
    }

    let token = secrets::url_safe_token();
    let mut active = profile.into_active_model();
    active.email_verification_token = Set(Some(token.clone()));
    active.update(db).await?;

    Ok(Some((user, token)))
}

/// Stores a reset token for the account behind `email`, if there is one.
///
/// The token shares the profile's verification-token slot, so a pending verification link
/// stops working once a reset is requested.
pub async fn request_password_reset(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<(user::Model, String)>> {
    let Some(user) = find_by_email(db, email).await? else {
        debug!("Password reset requested for unknown email");
        return Ok(None);
    };

    let profile = profiles::get_or_create(db, &user).await?;
    let token = secrets::url_safe_token();
    let mut active = profile.into_active_model();
    active.email_verification_token = Set(Some(token.clone()));
    active.update(db).await?;

    info!("Password reset token issued for user {}", user.id);
    Ok(Some((user, token)))
}

pub async fn reset_password(
    db: &DatabaseConnection,
    token: &str,
    new_password: &str,
) -> Result<user::Model> {
    let invalid = || DomainError::Rejected("Invalid or expired reset token.".to_string());

    if secrets::is_blank_token(token) {
        return Err(invalid());
    }

    let profile = find_by_token(db, token).await?.ok_or_else(invalid)?;
    let user = user::Entity::find_by_id(profile.user_id)
        .one(db)
        .await?
        .ok_or_else(invalid)?;

    let password_hash = hash_password(new_password)?;

    let txn = db.begin().await?;
    let mut active_user = user.into_active_model();
    active_user.password_hash = Set(password_hash);
    let user = active_user.update(&txn).await?;

    let mut active_profile = profile.into_active_model();
    active_profile.email_verification_token = Set(None);
    active_profile.update(&txn).await?;
    txn.commit().await?;

    info!("Password reset for user {}", user.id);
    Ok(user)
}

async fn find_by_token<C: ConnectionTrait>(db: &C, token: &str) -> Result<Option<profile::Model>> {
    Ok(profile::Entity::find()
        .filter(profile::Column::EmailVerificationToken.eq(token))
        .one(db)
        .await?)
}

async fn find_target<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::NotFound("User not found.".to_string()))
}

/// Sets the approval flag of a regular account.
pub async fn set_approval(
    db: &DatabaseConnection,
    actor: &user::Model,
    target_id: i32,
    is_approved: bool,
) -> Result<(user::Model, profile::Model)> {
    ensure_admin(actor, ADMIN_ONLY)?;
    let target = find_target(db, target_id).await?;

    if target.is_admin() {
        return Err(DomainError::Rejected(
            "Cannot modify approval status for staff or superuser accounts.".to_string(),
        ));
    }

    let profile = profiles::get_or_create(db, &target).await?;
    let mut active = profile.into_active_model();
    active.is_approved = Set(is_approved);
    let profile = active.update(db).await?;

    info!(
        "User {} set approval of user {} to {}",
        actor.id, target.id, is_approved
    );
    Ok((target, profile))
}

/// Activates or deactivates an account. Nobody can switch their own account.
pub async fn set_active(
    db: &DatabaseConnection,
    actor: &user::Model,
    target_id: i32,
    is_active: bool,
) -> Result<user::Model> {
    ensure_admin(actor, ADMIN_ONLY)?;
    let target = find_target(db, target_id).await?;

    if target.id == actor.id {
        return Err(DomainError::Rejected(
            "You cannot deactivate your own account.".to_string(),
        ));
    }

    let mut active = target.into_active_model();
    active.is_active = Set(is_active);
    let target = active.update(db).await?;

    info!(
        "User {} set is_active of user {} to {}",
        actor.id, target.id, is_active
    );
    Ok(target)
}

/// Loads a user for staff inspection.
pub async fn get_user(db: &DatabaseConnection, actor: &user::Model, user_id: i32) -> Result<user::Model> {
    ensure_admin(actor, ADMIN_ONLY)?;
    find_target(db, user_id).await
}

pub struct UserPage {
    pub users: Vec<(user::Model, profile::Model)>,
    pub window: PageWindow,
}

/// One page of all accounts, newest first, each with its profile (created if missing).
pub async fn list_users(
    db: &DatabaseConnection,
    actor: &user::Model,
    request: PageRequest,
) -> Result<UserPage> {
    ensure_admin(actor, "You do not have permission to view all users.")?;

    let total = user::Entity::find().count(db).await?;
    let window = PageWindow::new(request, total);

    let page = user::Entity::find()
        .order_by_desc(user::Column::DateJoined)
        .order_by_desc(user::Column::Id)
        .offset(window.offset())
        .limit(window.page_size)
        .all(db)
        .await?;

    let mut users = Vec::with_capacity(page.len());
    for account in page {
        let profile = profiles::get_or_create(db, &account).await?;
        users.push((account, profile));
    }

    Ok(UserPage { users, window })
}
