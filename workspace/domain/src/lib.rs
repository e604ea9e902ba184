//! Business rules of the portfolio service.
//!
//! Everything here takes its database connection as a parameter and returns
//! [`error::DomainError`]; the HTTP layer decides how failures are presented.

pub mod access;
pub mod accounts;
pub mod content;
pub mod error;
pub mod messages;
pub mod overview;
pub mod pagination;
pub mod password;
pub mod portfolio;
pub mod profiles;
pub mod publish;
pub mod secrets;
pub mod slug;
pub mod tokens;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AuthFailure, DomainError, FieldErrors, Result};
