use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Networks a portfolio can link to. Anything unlisted is `Other`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
pub enum Platform {
    #[sea_orm(string_value = "facebook")]
    Facebook,
    #[sea_orm(string_value = "instagram")]
    Instagram,
    #[sea_orm(string_value = "twitter")]
    Twitter,
    #[sea_orm(string_value = "linkedin")]
    Linkedin,
    #[sea_orm(string_value = "github")]
    Github,
    #[sea_orm(string_value = "youtube")]
    Youtube,
    #[sea_orm(string_value = "tiktok")]
    Tiktok,
    #[sea_orm(string_value = "whatsapp")]
    Whatsapp,
    #[sea_orm(string_value = "telegram")]
    Telegram,
    #[sea_orm(string_value = "discord")]
    Discord,
    #[sea_orm(string_value = "reddit")]
    Reddit,
    #[sea_orm(string_value = "pinterest")]
    Pinterest,
    #[sea_orm(string_value = "snapchat")]
    Snapchat,
    #[sea_orm(string_value = "behance")]
    Behance,
    #[sea_orm(string_value = "dribbble")]
    Dribbble,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "devto")]
    Devto,
    #[sea_orm(string_value = "codepen")]
    Codepen,
    #[sea_orm(string_value = "stackoverflow")]
    Stackoverflow,
    #[default]
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "social_media")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: Option<i32>,
    pub platform: Platform,
    /// Free-form display name, e.g. a handle.
    pub platform_name: String,
    pub url: String,
    pub icon_image: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = chrono::Utc::now();
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(now);
        }
        self.updated_at = Set(now);
        Ok(self)
    }
}
