//! Tax report entity - a generated daily, monthly or yearly aggregate.
//!
//! At most one row exists per `(report_type, report_date)`; the pair is backed by a unique
//! index created in `config::database::create_tables`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tax report database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tax_reports")]
pub struct Model {
    /// Unique identifier for the report
    #[sea_orm(primary_key)]
    pub id: i64,
    /// `daily`, `monthly` or `yearly`
    pub report_type: String,
    /// Period key: `YYYY-MM-DD`, `YYYY-MM` or `YYYY`
    pub report_date: String,
    /// Calendar year of the period
    pub year: i32,
    /// Month of the period (monthly and daily reports)
    pub month: Option<i32>,
    /// Day of the period (daily reports)
    pub day: Option<i32>,
    /// Tax collected across all counted orders
    pub total_tax_collected: f64,
    /// Revenue excluding tax
    pub total_pre_tax_revenue: f64,
    /// Revenue including tax
    pub total_inc_tax_revenue: f64,
    /// Number of orders counted
    pub total_orders: i64,
    /// `total_tax_collected / total_orders`, 0 without orders
    pub average_tax_per_order: f64,
    /// `total_inc_tax_revenue / total_orders`, 0 without orders
    pub average_order_value: f64,
    /// JSON map of rate label (`"13.5%"`) to `{amount, orders}`
    pub tax_breakdown: String,
    /// JSON encoded per-order details, when requested
    pub order_details: Option<String>,
    /// When the report was first generated
    pub created_at: DateTimeUtc,
    /// When the report was last regenerated
    pub updated_at: DateTimeUtc,
}

/// `TaxReport` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
