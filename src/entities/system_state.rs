//! System state entity - key/value bookkeeping for background jobs.
//! The report rollover job stores the last period key it generated per report type
//! (e.g. `last_daily_report` = `2025-01-10`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// System state database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "system_state")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Bookkeeping key (e.g., `"last_monthly_report"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Stored value
    pub value: String,
    /// When this entry was last written
    pub updated_at: DateTime,
}

/// `SystemState` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
