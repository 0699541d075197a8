//! Shared test utilities for the ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating menu entries and orders with sensible defaults.

use crate::{
    core::{
        menu::{self, NewMenuItem},
        order::{self, CartLine, NewOrder, OrderStatus},
        tax_rate::TaxRates,
    },
    entities::{self, Order},
    errors::Result,
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a UTC timestamp on the hour.
///
/// # Panics
/// Panics on an invalid date; test input only.
#[allow(clippy::unwrap_used)]
pub fn utc(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

/// Creates a test category with an optional rate override.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
    tax_rate: Option<Decimal>,
) -> Result<entities::menu_category::Model> {
    menu::create_category(db, name.to_string(), tax_rate).await
}

/// Creates a test menu item without option groups, using the default 13.5% rate chain.
pub async fn create_test_menu_item(
    db: &DatabaseConnection,
    name: &str,
    category_id: i64,
    price: Decimal,
    tax_rate: Option<Decimal>,
) -> Result<entities::menu_item::Model> {
    menu::create_menu_item(
        db,
        &TaxRates::default(),
        NewMenuItem {
            name: name.to_string(),
            category_id,
            price,
            tax_rate,
            option_groups: Vec::new(),
        },
    )
    .await
}

/// A cart line without customizations.
pub fn cart_line(menu_item_id: i64, quantity: i32) -> CartLine {
    CartLine {
        menu_item_id,
        quantity,
        ..Default::default()
    }
}

/// Places an order of `(menu_item_id, quantity)` lines at a fixed time, with no service fee.
pub async fn place_test_order(
    db: &DatabaseConnection,
    lines: &[(i64, i32)],
    created_at: DateTime<Utc>,
) -> Result<entities::order::Model> {
    order::place_order_at(
        db,
        &TaxRates::default(),
        Decimal::ZERO,
        NewOrder {
            customer_name: "Test Customer".to_string(),
            lines: lines.iter().map(|&(id, qty)| cart_line(id, qty)).collect(),
            ..Default::default()
        },
        created_at,
    )
    .await
}

/// Places an order and marks it completed so it counts in reports.
pub async fn complete_test_order(
    db: &DatabaseConnection,
    lines: &[(i64, i32)],
    created_at: DateTime<Utc>,
) -> Result<entities::order::Model> {
    let placed = place_test_order(db, lines, created_at).await?;
    order::update_order_status(db, placed.id, OrderStatus::Completed).await
}

/// Inserts an order row directly, bypassing checkout.
///
/// Used to simulate legacy or corrupted rows (`items` is written as given).
pub async fn insert_raw_order(
    db: &DatabaseConnection,
    items_json: &str,
    total: f64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
) -> Result<entities::order::Model> {
    let row = entities::order::ActiveModel {
        customer_name: Set("Legacy".to_string()),
        customer_email: Set(None),
        customer_phone: Set(None),
        order_date: Set(created_at.date_naive()),
        daily_number: Set(order::next_daily_number(db, created_at.date_naive()).await?),
        subtotal: Set(total),
        service_fee: Set(0.0),
        tax: Set(0.0),
        total: Set(total),
        status: Set(status.as_str().to_string()),
        items: Set(items_json.to_string()),
        created_at: Set(created_at),
        updated_at: Set(created_at),
        ..Default::default()
    };
    let result = Order::insert(row).exec(db).await?;
    order::get_order(db, result.last_insert_id)
        .await?
        .ok_or(crate::errors::Error::OrderNotFound {
            id: result.last_insert_id,
        })
}
