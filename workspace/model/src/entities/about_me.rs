use sea_orm::entity::prelude::*;
use sea_orm::Set;

/// The "about" block of a portfolio. A user normally has one, but nothing forbids more;
/// readers take the first.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "about_me")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Owner; `None` for rows that belong to the site itself.
    pub user_id: Option<i32>,
    pub name: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub bio: String,
    pub profile_image: Option<String>,
    pub logo_image: Option<String>,
    pub cv_file: Option<String>,
    pub years_of_experience: i32,
    pub clients: Option<i32>,
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
