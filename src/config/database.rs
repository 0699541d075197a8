//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`. Tables are
//! generated from the entity definitions with `Schema::create_table_from_entity`, so the
//! schema always matches the Rust structs. Indexes spanning several columns cannot be
//! expressed on the entities and are created here explicitly.

use crate::entities::{
    MenuCategory, MenuItem, Order, OrderColumn, SystemState, TaxReport, TaxReportColumn,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/bistro_ledger.sqlite?mode=rwc";

/// Name of the unique index that makes report upserts conflict on the period key.
pub const REPORT_PERIOD_INDEX: &str = "idx_tax_reports_period";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the
/// default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    info!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    Ok(())
}

/// Creates all tables and indexes. Safe to call on every start.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, MenuCategory).await?;
    create_table(db, &schema, MenuItem).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, TaxReport).await?;
    create_table(db, &schema, SystemState).await?;

    // Backstop for concurrent regeneration of the same period
    let period_index = Index::create()
        .name(REPORT_PERIOD_INDEX)
        .table(TaxReport)
        .col(TaxReportColumn::ReportType)
        .col(TaxReportColumn::ReportDate)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&period_index)).await?;

    let created_at_index = Index::create()
        .name("idx_orders_created_at")
        .table(Order)
        .col(OrderColumn::CreatedAt)
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&created_at_index)).await?;

    let daily_number_index = Index::create()
        .name("idx_orders_daily_number")
        .table(Order)
        .col(OrderColumn::OrderDate)
        .col(OrderColumn::DailyNumber)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&daily_number_index)).await?;

    Ok(())
}
