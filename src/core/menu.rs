//! Menu business logic - categories, menu items and their prices.
//!
//! Every stored item keeps `price ≈ base_price × (1 + effective rate)`. The admin edits one
//! side of the pair at a time through [`PriceEdit`]; the other side is derived once with the
//! rate resolved from the item's own category. Edits never touch the item's `tax_rate`.

use crate::{
    config::settings::Settings,
    core::{
        customization::{self, OptionGroup},
        money,
        tax_rate::{self, TaxRates},
    },
    entities::{MenuCategory, MenuItem, menu_category, menu_item},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Which side of the price pair the admin changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceEdit {
    /// New tax-inclusive price; the base price is recomputed
    DisplayPrice(Decimal),
    /// New pre-tax price; the display price is recomputed
    BasePrice(Decimal),
}

/// A consistent `(price, base_price)` pair, both rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricePair {
    /// Tax-inclusive price
    pub price: Decimal,
    /// Pre-tax price
    pub base_price: Decimal,
}

/// Input for [`create_menu_item`].
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    /// Item name
    pub name: String,
    /// Owning category
    pub category_id: i64,
    /// Tax-inclusive price
    pub price: Decimal,
    /// Optional item-level rate override
    pub tax_rate: Option<Decimal>,
    /// Customization groups offered with the item
    pub option_groups: Vec<OptionGroup>,
}

/// Derives the other half of the price pair from a single edit.
///
/// # Errors
/// Returns `InvalidAmount` for a negative price.
pub fn compute_price_pair(edit: PriceEdit, rate: Decimal) -> Result<PricePair> {
    match edit {
        PriceEdit::DisplayPrice(price) => {
            money::validate_amount(price)?;
            let price = money::round_money(price);
            Ok(PricePair {
                price,
                base_price: money::round_money(money::to_base_price(price, rate)),
            })
        }
        PriceEdit::BasePrice(base_price) => {
            money::validate_amount(base_price)?;
            let base_price = money::round_money(base_price);
            Ok(PricePair {
                price: money::round_money(money::to_tax_inclusive(base_price, rate)),
                base_price,
            })
        }
    }
}

/// Creates a category with an optional tax rate override.
///
/// # Errors
/// Returns an error if the name is empty, the rate is out of range, or the insert fails
/// (including a duplicate name).
pub async fn create_category<C>(
    db: &C,
    name: String,
    tax_rate: Option<Decimal>,
) -> Result<menu_category::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Category name cannot be empty".to_string(),
        });
    }
    if let Some(rate) = tax_rate {
        money::validate_rate(rate)?;
    }

    let now = chrono::Utc::now().naive_utc();
    let category = menu_category::ActiveModel {
        name: Set(name.trim().to_string()),
        tax_rate: Set(tax_rate.map(rate_to_f64)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    category.insert(db).await.map_err(Into::into)
}

/// Retrieves a category by id.
pub async fn get_category<C>(db: &C, category_id: i64) -> Result<Option<menu_category::Model>>
where
    C: ConnectionTrait,
{
    MenuCategory::find_by_id(category_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a category by its exact name.
pub async fn get_category_by_name<C>(db: &C, name: &str) -> Result<Option<menu_category::Model>>
where
    C: ConnectionTrait,
{
    MenuCategory::find()
        .filter(menu_category::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Sets or clears a category's tax rate override.
///
/// Stored item prices are not touched; they are re-derived on the next price edit.
///
/// # Errors
/// Returns `CategoryNotFound` if the category does not exist.
pub async fn update_category_tax_rate<C>(
    db: &C,
    category_id: i64,
    tax_rate: Option<Decimal>,
) -> Result<menu_category::Model>
where
    C: ConnectionTrait,
{
    if let Some(rate) = tax_rate {
        money::validate_rate(rate)?;
    }
    let mut category: menu_category::ActiveModel = get_category(db, category_id)
        .await?
        .ok_or(Error::CategoryNotFound { id: category_id })?
        .into();

    category.tax_rate = Set(tax_rate.map(rate_to_f64));
    category.updated_at = Set(chrono::Utc::now().naive_utc());
    category.update(db).await.map_err(Into::into)
}

/// Retrieves a menu item by id, including unavailable ones.
pub async fn get_menu_item<C>(db: &C, item_id: i64) -> Result<Option<menu_item::Model>>
where
    C: ConnectionTrait,
{
    MenuItem::find_by_id(item_id).one(db).await.map_err(Into::into)
}

/// Finds an available menu item by its exact name.
pub async fn get_menu_item_by_name<C>(db: &C, name: &str) -> Result<Option<menu_item::Model>>
where
    C: ConnectionTrait,
{
    MenuItem::find()
        .filter(menu_item::Column::Name.eq(name))
        .filter(menu_item::Column::IsAvailable.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists available menu items alphabetically.
pub async fn get_available_menu_items<C>(db: &C) -> Result<Vec<menu_item::Model>>
where
    C: ConnectionTrait,
{
    MenuItem::find()
        .filter(menu_item::Column::IsAvailable.eq(true))
        .order_by_asc(menu_item::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Resolves an item's effective rate, loading its category.
///
/// A missing category is not an error; the item's own rate or the default applies.
pub async fn effective_rate<C>(db: &C, rates: &TaxRates, item: &menu_item::Model) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let category = get_category(db, item.category_id).await?;
    Ok(tax_rate::resolve_tax_rate(rates, item, category.as_ref()))
}

/// Creates a menu item, deriving its base price from the effective rate.
///
/// # Errors
/// Returns an error if the name is empty, the price or rate is invalid, the category does
/// not exist, or the insert fails.
pub async fn create_menu_item<C>(
    db: &C,
    rates: &TaxRates,
    new_item: NewMenuItem,
) -> Result<menu_item::Model>
where
    C: ConnectionTrait,
{
    if new_item.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Menu item name cannot be empty".to_string(),
        });
    }
    if let Some(rate) = new_item.tax_rate {
        money::validate_rate(rate)?;
    }

    let category = get_category(db, new_item.category_id)
        .await?
        .ok_or(Error::CategoryNotFound {
            id: new_item.category_id,
        })?;
    let rate = rates.resolve(
        new_item.tax_rate,
        category.tax_rate.map(money::stored_rate),
    );
    let pair = compute_price_pair(PriceEdit::DisplayPrice(new_item.price), rate)?;

    let now = chrono::Utc::now().naive_utc();
    let item = menu_item::ActiveModel {
        name: Set(new_item.name.trim().to_string()),
        category_id: Set(category.id),
        price: Set(money::to_f64(pair.price)),
        base_price: Set(Some(money::to_f64(pair.base_price))),
        tax_rate: Set(new_item.tax_rate.map(rate_to_f64)),
        option_groups: Set(customization::encode_option_groups(&new_item.option_groups)?),
        is_available: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    item.insert(db).await.map_err(Into::into)
}

/// Applies a single price edit to a stored item and persists both prices.
///
/// # Errors
/// Returns `MenuItemNotFound` for an unknown item or `InvalidAmount` for a negative price.
pub async fn apply_price_edit<C>(
    db: &C,
    rates: &TaxRates,
    item_id: i64,
    edit: PriceEdit,
) -> Result<menu_item::Model>
where
    C: ConnectionTrait,
{
    let item = get_menu_item(db, item_id)
        .await?
        .ok_or(Error::MenuItemNotFound { id: item_id })?;
    let rate = effective_rate(db, rates, &item).await?;
    let pair = compute_price_pair(edit, rate)?;

    let mut active: menu_item::ActiveModel = item.into();
    active.price = Set(money::to_f64(pair.price));
    active.base_price = Set(Some(money::to_f64(pair.base_price)));
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(db).await.map_err(Into::into)
}

/// Marks an item as (un)available without deleting it.
///
/// # Errors
/// Returns `MenuItemNotFound` for an unknown item.
pub async fn set_menu_item_available<C>(
    db: &C,
    item_id: i64,
    available: bool,
) -> Result<menu_item::Model>
where
    C: ConnectionTrait,
{
    let mut active: menu_item::ActiveModel = get_menu_item(db, item_id)
        .await?
        .ok_or(Error::MenuItemNotFound { id: item_id })?
        .into();
    active.is_available = Set(available);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(db).await.map_err(Into::into)
}

/// Creates the categories and menu items listed in the settings that do not exist yet.
///
/// Returns the number of rows created.
///
/// # Errors
/// Returns an error if a configured value is invalid, a menu item names an unknown
/// category, or a database operation fails.
pub async fn seed_menu<C>(db: &C, settings: &Settings) -> Result<usize>
where
    C: ConnectionTrait,
{
    let rates = settings.tax_rates()?;
    let mut created = 0;

    for config in &settings.categories {
        if get_category_by_name(db, &config.name).await?.is_some() {
            continue;
        }
        let tax_rate = config.tax_rate.map(money::rate_from_f64).transpose()?;
        create_category(db, config.name.clone(), tax_rate).await?;
        created += 1;
    }

    for config in &settings.menu_items {
        if get_menu_item_by_name(db, &config.name).await?.is_some() {
            continue;
        }
        let category = get_category_by_name(db, &config.category)
            .await?
            .ok_or_else(|| Error::Config {
                message: format!(
                    "Menu item '{}' references unknown category '{}'",
                    config.name, config.category
                ),
            })?;
        create_menu_item(
            db,
            &rates,
            NewMenuItem {
                name: config.name.clone(),
                category_id: category.id,
                price: money::amount_from_f64(config.price)?,
                tax_rate: config.tax_rate.map(money::rate_from_f64).transpose()?,
                option_groups: Vec::new(),
            },
        )
        .await?;
        created += 1;
    }

    if created > 0 {
        info!("Seeded {created} menu rows from configuration");
    }
    Ok(created)
}

fn rate_to_f64(rate: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    rate.to_f64().unwrap_or_default()
}
