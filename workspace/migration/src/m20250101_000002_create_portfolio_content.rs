use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250101_000001_create_accounts::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn owner_fk<T, C>(name: &str, table: T, column: C) -> ForeignKeyCreateStatement
where
    T: IntoTableRef,
    C: IntoIden,
{
    ForeignKey::create()
        .name(name)
        .from(table, column)
        .to(Users::Table, Users::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .on_update(ForeignKeyAction::Cascade)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AboutMe::Table)
                    .if_not_exists()
                    .col(pk_auto(AboutMe::Id))
                    .col(integer_null(AboutMe::UserId))
                    .col(string_len(AboutMe::Name, 200))
                    .col(string_len(AboutMe::Title, 200))
                    .col(text(AboutMe::Bio))
                    .col(string_null(AboutMe::ProfileImage))
                    .col(string_null(AboutMe::LogoImage))
                    .col(string_null(AboutMe::CvFile))
                    .col(integer(AboutMe::YearsOfExperience).default(0))
                    .col(integer_null(AboutMe::Clients))
                    .col(timestamp_with_time_zone(AboutMe::CreatedAt))
                    .col(timestamp_with_time_zone(AboutMe::UpdatedAt))
                    .foreign_key(&mut owner_fk("fk_about_me_user", AboutMe::Table, AboutMe::UserId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(pk_auto(Projects::Id))
                    .col(integer_null(Projects::UserId))
                    .col(string_len(Projects::Title, 200))
                    .col(text(Projects::Description))
                    .col(string_null(Projects::ProjectImage))
                    .col(string_null(Projects::GithubLink))
                    .col(string_null(Projects::LiveDemoLink))
                    .col(timestamp_with_time_zone(Projects::CreatedAt))
                    .col(timestamp_with_time_zone(Projects::UpdatedAt))
                    .foreign_key(&mut owner_fk("fk_project_user", Projects::Table, Projects::UserId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Experiences::Table)
                    .if_not_exists()
                    .col(pk_auto(Experiences::Id))
                    .col(integer_null(Experiences::UserId))
                    .col(string_len(Experiences::Role, 200))
                    .col(string_len(Experiences::Company, 200))
                    .col(date(Experiences::StartDate))
                    .col(date_null(Experiences::EndDate))
                    .col(text(Experiences::Description))
                    .col(timestamp_with_time_zone(Experiences::CreatedAt))
                    .col(timestamp_with_time_zone(Experiences::UpdatedAt))
                    .foreign_key(&mut owner_fk(
                        "fk_experience_user",
                        Experiences::Table,
                        Experiences::UserId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Educations::Table)
                    .if_not_exists()
                    .col(pk_auto(Educations::Id))
                    .col(integer_null(Educations::UserId))
                    .col(string_len(Educations::Institution, 200))
                    .col(string_len(Educations::Degree, 200))
                    .col(integer(Educations::StartYear))
                    .col(integer_null(Educations::EndYear))
                    .col(text_null(Educations::Description))
                    .col(timestamp_with_time_zone(Educations::CreatedAt))
                    .col(timestamp_with_time_zone(Educations::UpdatedAt))
                    .foreign_key(&mut owner_fk(
                        "fk_education_user",
                        Educations::Table,
                        Educations::UserId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Skills::Table)
                    .if_not_exists()
                    .col(pk_auto(Skills::Id))
                    .col(integer_null(Skills::UserId))
                    .col(string_len(Skills::Name, 100))
                    .col(string_len(Skills::Level, 20))
                    .col(string_null(Skills::IconImage))
                    .col(timestamp_with_time_zone(Skills::CreatedAt))
                    .col(timestamp_with_time_zone(Skills::UpdatedAt))
                    .foreign_key(&mut owner_fk("fk_skill_user", Skills::Table, Skills::UserId))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SocialMedia::Table)
                    .if_not_exists()
                    .col(pk_auto(SocialMedia::Id))
                    .col(integer_null(SocialMedia::UserId))
                    .col(string_len(SocialMedia::Platform, 50).default("other"))
                    .col(string_len(SocialMedia::PlatformName, 100))
                    .col(string(SocialMedia::Url))
                    .col(string_null(SocialMedia::IconImage))
                    .col(timestamp_with_time_zone(SocialMedia::CreatedAt))
                    .col(timestamp_with_time_zone(SocialMedia::UpdatedAt))
                    .foreign_key(&mut owner_fk(
                        "fk_social_media_user",
                        SocialMedia::Table,
                        SocialMedia::UserId,
                    ))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SocialMedia::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Skills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Educations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Experiences::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AboutMe::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum AboutMe {
    Table,
    Id,
    UserId,
    Name,
    Title,
    Bio,
    ProfileImage,
    LogoImage,
    CvFile,
    YearsOfExperience,
    Clients,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    UserId,
    Title,
    Description,
    ProjectImage,
    GithubLink,
    LiveDemoLink,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Experiences {
    Table,
    Id,
    UserId,
    Role,
    Company,
    StartDate,
    EndDate,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Educations {
    Table,
    Id,
    UserId,
    Institution,
    Degree,
    StartYear,
    EndYear,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Skills {
    Table,
    Id,
    UserId,
    Name,
    Level,
    IconImage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SocialMedia {
    Table,
    Id,
    UserId,
    Platform,
    PlatformName,
    Url,
    IconImage,
    CreatedAt,
    UpdatedAt,
}
