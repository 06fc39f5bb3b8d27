//! Migration to create the job_approval_requests table.
//!
//! At most one request per job may be in the pending state; the partial
//! uniqueness is enforced at the service layer (supersede-not-append), the
//! index below keeps the per-job status lookups cheap.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JobApprovalRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JobApprovalRequests::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JobApprovalRequests::JobId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JobApprovalRequests::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(JobApprovalRequests::Data).json_binary().null())
                    .col(
                        ColumnDef::new(JobApprovalRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(JobApprovalRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_job_approval_requests_job_id")
                            .from(JobApprovalRequests::Table, JobApprovalRequests::JobId)
                            .to(Jobs::Table, Jobs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_job_approval_requests_job_status")
                    .table(JobApprovalRequests::Table)
                    .col(JobApprovalRequests::JobId)
                    .col(JobApprovalRequests::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_job_approval_requests_job_status")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(JobApprovalRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum JobApprovalRequests {
    Table,
    Id,
    JobId,
    Status,
    Data,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
}
