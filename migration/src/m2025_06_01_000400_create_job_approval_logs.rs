//! Migration to create the job_approval_logs table.
//!
//! Append-only audit trail: one row per status transition, never updated.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JobApprovalLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobApprovalLogs::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JobApprovalLogs::JobId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JobApprovalLogs::AdminId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JobApprovalLogs::PreviousStatus)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JobApprovalLogs::NewStatus).text().not_null())
                    .col(
                        ColumnDef::new(JobApprovalLogs::Reason)
                            .string_len(100)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(JobApprovalLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_approval_logs_job_id")
                            .from(JobApprovalLogs::Table, JobApprovalLogs::JobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_approval_logs_job_created")
                    .table(JobApprovalLogs::Table)
                    .col(JobApprovalLogs::JobId)
                    .col(JobApprovalLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_job_approval_logs_job_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(JobApprovalLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum JobApprovalLogs {
    Table,
    Id,
    JobId,
    AdminId,
    PreviousStatus,
    NewStatus,
    Reason,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
}
