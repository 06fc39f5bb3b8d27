//! Migration to create the jobs table and its field-collection tables.
//!
//! Field collections (skills, locations, categories, working times) are
//! junction rows replaced wholesale when an approved edit payload is applied.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Jobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Jobs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Jobs::BusinessId).big_integer().not_null())
                    .col(ColumnDef::new(Jobs::CampaignId).big_integer().not_null())
                    .col(ColumnDef::new(Jobs::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Jobs::Description).text().null())
                    .col(
                        ColumnDef::new(Jobs::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Jobs::Deadline).date().not_null())
                    .col(
                        ColumnDef::new(Jobs::EmployerVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Jobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Jobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_business_status")
                    .table(Jobs::Table)
                    .col(Jobs::BusinessId)
                    .col(Jobs::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_status_deadline")
                    .table(Jobs::Table)
                    .col(Jobs::Status)
                    .col(Jobs::Deadline)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JobSkills::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobSkills::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JobSkills::JobId).big_integer().not_null())
                    .col(ColumnDef::new(JobSkills::SkillId).big_integer().not_null())
                    .col(
                        ColumnDef::new(JobSkills::Kind)
                            .text()
                            .not_null()
                            .default("must_have"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_skills_job_id")
                            .from(JobSkills::Table, JobSkills::JobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JobLocations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobLocations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(JobLocations::JobId).big_integer().not_null())
                    .col(
                        ColumnDef::new(JobLocations::ProvinceId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JobLocations::DistrictId)
                            .big_integer()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_locations_job_id")
                            .from(JobLocations::Table, JobLocations::JobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JobCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobCategories::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JobCategories::JobId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JobCategories::CategoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_categories_job_id")
                            .from(JobCategories::Table, JobCategories::JobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JobWorkingTimes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobWorkingTimes::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JobWorkingTimes::JobId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JobWorkingTimes::StartTime)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JobWorkingTimes::EndTime)
                            .string_len(16)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_working_times_job_id")
                            .from(JobWorkingTimes::Table, JobWorkingTimes::JobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JobWorkingTimes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JobCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JobLocations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JobSkills::Table).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name("idx_jobs_business_status").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_jobs_status_deadline").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Jobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
    BusinessId,
    CampaignId,
    Title,
    Description,
    Status,
    Deadline,
    EmployerVerified,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum JobSkills {
    Table,
    Id,
    JobId,
    SkillId,
    Kind,
}

#[derive(DeriveIden)]
enum JobLocations {
    Table,
    Id,
    JobId,
    ProvinceId,
    DistrictId,
}

#[derive(DeriveIden)]
enum JobCategories {
    Table,
    Id,
    JobId,
    CategoryId,
}

#[derive(DeriveIden)]
enum JobWorkingTimes {
    Table,
    Id,
    JobId,
    StartTime,
    EndTime,
}
