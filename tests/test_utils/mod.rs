//! Shared helpers for integration tests.

use jobmarket::migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn insert_account(
    db: &DatabaseConnection,
    name: &str,
    role: &str,
    type_account: &str,
) -> i64 {
    jobmarket::models::account::ActiveModel {
        full_name: Set(name.to_string()),
        email: Set(format!("{name}@example.com")),
        role: Set(role.to_string()),
        type_account: Set(type_account.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert account")
    .id
}
