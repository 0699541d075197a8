//! Menu category entity - groups menu items and optionally overrides their tax rate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu category database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Drinks", "Mains")
    #[sea_orm(unique)]
    pub name: String,
    /// Tax rate override as a fraction (0.23 = 23%), applied to items without their own rate
    pub tax_rate: Option<f64>,
    /// When the category was created
    pub created_at: DateTime,
    /// When the category was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between `MenuCategory` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category has many menu items
    #[sea_orm(has_many = "super::menu_item::Entity")]
    MenuItems,
}

impl Related<super::menu_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
