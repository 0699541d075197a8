//! Order entity - a placed customer order.
//!
//! Financial fields are written once at checkout and never recomputed. `items` holds the
//! JSON encoded line items (see `core::order::OrderItem`); SQLite has no array columns.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer name as entered at checkout
    pub customer_name: String,
    /// Optional contact email
    pub customer_email: Option<String>,
    /// Optional contact phone number
    pub customer_phone: Option<String>,
    /// UTC day the order was placed
    pub order_date: Date,
    /// Sequential number within `order_date` (1, 2, ...), unique per day
    pub daily_number: i32,
    /// Sum of tax-inclusive line totals
    pub subtotal: f64,
    /// Flat service fee added on top of the subtotal
    pub service_fee: f64,
    /// Tax embedded in the subtotal (informational)
    pub tax: f64,
    /// Amount charged: `subtotal + service_fee`
    pub total: f64,
    /// One of `pending`, `confirmed`, `preparing`, `ready`, `completed`, `cancelled`
    pub status: String,
    /// JSON encoded line item snapshots
    pub items: String,
    /// When the order was placed
    pub created_at: DateTimeUtc,
    /// When the status last changed
    pub updated_at: DateTimeUtc,
}

/// Orders snapshot their items and reference nothing
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
