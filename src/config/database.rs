//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. The composite unique indexes that back
//! the one-month-per-calendar-slot and one-payment-per-flat-month rules are
//! created here as well, since the entity derive can only express
//! single-column uniqueness.

use crate::entities::{AppConfig, Flat, Month, Payment, Reminder, month, payment};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, Schema,
    sea_query::{Index, IndexCreateStatement},
};

/// Gets the database URL from the environment or returns the default
/// `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/maintenance_buddy.sqlite?mode=rwc".to_string())
}

/// Establishes a connection using the `DATABASE_URL` environment variable,
/// falling back to a local `SQLite` file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all tables and indexes. Idempotent, so it runs on every startup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut flat_table = schema.create_table_from_entity(Flat);
    let mut month_table = schema.create_table_from_entity(Month);
    let mut payment_table = schema.create_table_from_entity(Payment);
    let mut reminder_table = schema.create_table_from_entity(Reminder);
    let mut app_config_table = schema.create_table_from_entity(AppConfig);

    db.execute(builder.build(flat_table.if_not_exists())).await?;
    db.execute(builder.build(month_table.if_not_exists())).await?;
    db.execute(builder.build(payment_table.if_not_exists())).await?;
    db.execute(builder.build(reminder_table.if_not_exists())).await?;
    db.execute(builder.build(app_config_table.if_not_exists())).await?;

    for index in composite_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    Ok(())
}

/// Unique indexes spanning more than one column.
fn composite_indexes() -> Vec<IndexCreateStatement> {
    vec![
        // One month row per calendar slot
        Index::create()
            .if_not_exists()
            .name("idx_months_month_year")
            .table(month::Entity)
            .col(month::Column::Month)
            .col(month::Column::Year)
            .unique()
            .to_owned(),
        // One payment row per flat and month (rejected rows are deleted on
        // resubmission, so the constraint holds across all stored statuses)
        Index::create()
            .if_not_exists()
            .name("idx_payments_flat_month")
            .table(payment::Entity)
            .col(payment::Column::FlatId)
            .col(payment::Column::MonthId)
            .unique()
            .to_owned(),
    ]
}
