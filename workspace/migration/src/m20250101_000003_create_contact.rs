use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250101_000001_create_accounts::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContactInfo::Table)
                    .if_not_exists()
                    .col(pk_auto(ContactInfo::Id))
                    .col(string_len(ContactInfo::Email, 254))
                    .col(string_len_null(ContactInfo::Phone, 50))
                    .col(string_len_null(ContactInfo::Location, 200))
                    .col(boolean(ContactInfo::IsActive).default(true))
                    .col(timestamp_with_time_zone(ContactInfo::CreatedAt))
                    .col(timestamp_with_time_zone(ContactInfo::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContactMessages::Table)
                    .if_not_exists()
                    .col(pk_auto(ContactMessages::Id))
                    .col(integer_null(ContactMessages::UserId))
                    .col(string_len(ContactMessages::Name, 200))
                    .col(string_len(ContactMessages::Email, 254))
                    .col(text(ContactMessages::Message))
                    .col(string_len(ContactMessages::Status, 20).default("new"))
                    .col(text_null(ContactMessages::Reply))
                    .col(timestamp_with_time_zone_null(ContactMessages::RepliedAt))
                    .col(timestamp_with_time_zone(ContactMessages::CreatedAt))
                    .col(timestamp_with_time_zone(ContactMessages::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contact_message_user")
                            .from(ContactMessages::Table, ContactMessages::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contact_message_user_status")
                    .table(ContactMessages::Table)
                    .col(ContactMessages::UserId)
                    .col(ContactMessages::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ContactMessages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContactInfo::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ContactInfo {
    Table,
    Id,
    Email,
    Phone,
    Location,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ContactMessages {
    Table,
    Id,
    UserId,
    Name,
    Email,
    Message,
    Status,
    Reply,
    RepliedAt,
    CreatedAt,
    UpdatedAt,
}
