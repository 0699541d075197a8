//! Entity module - SeaORM table definitions for the ledger.
//! Each entity has a Model struct for data and an Entity struct for queries.
//! Currency columns are stored as `f64`; arithmetic happens in `core::money` on `Decimal`.

pub mod menu_category;
pub mod menu_item;
pub mod order;
pub mod system_state;
pub mod tax_report;

// Re-export specific types to avoid conflicts
pub use menu_category::{
    Column as MenuCategoryColumn, Entity as MenuCategory, Model as MenuCategoryModel,
};
pub use menu_item::{Column as MenuItemColumn, Entity as MenuItem, Model as MenuItemModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use system_state::{
    Column as SystemStateColumn, Entity as SystemState, Model as SystemStateModel,
};
pub use tax_report::{Column as TaxReportColumn, Entity as TaxReport, Model as TaxReportModel};
