use model::entities::user;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Select};

use crate::{DomainError, Result};

/// Who is looking at owner-scoped data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: i32,
    pub is_admin: bool,
}

impl Viewer {
    pub fn of(user: &user::Model) -> Self {
        Self {
            user_id: user.id,
            is_admin: user.is_admin(),
        }
    }

    /// Admins manage everything; everyone else only what they own.
    pub fn can_manage(&self, owner: Option<i32>) -> bool {
        self.is_admin || owner == Some(self.user_id)
    }

    pub fn ensure_can_manage(&self, owner: Option<i32>) -> Result<()> {
        if self.can_manage(owner) {
            Ok(())
        } else {
            Err(DomainError::PermissionDenied(
                "You do not have permission to modify this record.".to_string(),
            ))
        }
    }

    /// Restricts a query to the rows this viewer may see.
    pub fn scope<E>(&self, query: Select<E>, owner_column: E::Column) -> Select<E>
    where
        E: EntityTrait,
    {
        if self.is_admin {
            query
        } else {
            query.filter(owner_column.eq(self.user_id))
        }
    }
}

/// Fails unless `user` is staff or a superuser.
pub fn ensure_admin(user: &user::Model, message: &str) -> Result<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(DomainError::PermissionDenied(message.to_string()))
    }
}
