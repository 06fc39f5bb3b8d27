//! Database migrations for the jobmarket backend.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_01_000100_create_accounts;
mod m2025_06_01_000200_create_jobs;
mod m2025_06_01_000300_create_job_approval_requests;
mod m2025_06_01_000400_create_job_approval_logs;
mod m2025_06_01_000500_create_conversations;
mod m2025_06_01_000600_create_messages;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_01_000100_create_accounts::Migration),
            Box::new(m2025_06_01_000200_create_jobs::Migration),
            Box::new(m2025_06_01_000300_create_job_approval_requests::Migration),
            Box::new(m2025_06_01_000400_create_job_approval_logs::Migration),
            Box::new(m2025_06_01_000500_create_conversations::Migration),
            Box::new(m2025_06_01_000600_create_messages::Migration),
        ]
    }
}
