pub mod about;
pub mod auth;
pub mod contact_info;
pub mod contact_messages;
pub mod education;
pub mod experience;
pub mod health;
pub mod portfolio;
pub mod profile;
pub mod projects;
pub mod skills;
pub mod social_media;
pub mod users;
