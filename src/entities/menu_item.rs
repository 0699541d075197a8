//! Menu item entity - something a customer can order.
//!
//! `price` is the tax-inclusive price shown to customers. `base_price` is derived from it
//! (or the other way round) using the effective tax rate at save time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_items")]
pub struct Model {
    /// Unique identifier for the menu item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name shown on the menu
    pub name: String,
    /// Category this item is listed under
    pub category_id: i64,
    /// Tax-inclusive unit price
    pub price: f64,
    /// Pre-tax unit price
    pub base_price: Option<f64>,
    /// Item-level tax rate override as a fraction
    pub tax_rate: Option<f64>,
    /// JSON encoded `Vec<OptionGroup>` describing available customizations
    pub option_groups: Option<String>,
    /// Hidden items stay referenced by historical orders but cannot be ordered
    pub is_available: bool,
    /// When the item was created
    pub created_at: DateTime,
    /// When the item was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between `MenuItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each menu item belongs to one category
    #[sea_orm(
        belongs_to = "super::menu_category::Entity",
        from = "Column::CategoryId",
        to = "super::menu_category::Column::Id"
    )]
    MenuCategory,
}

impl Related<super::menu_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
