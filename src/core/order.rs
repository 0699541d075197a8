//! Order business logic - line item snapshots, checkout and status changes.
//!
//! Every order line is an immutable snapshot of the menu item at checkout: name, unit price
//! (tax-inclusive, customizations included), base price, rate and unit tax. Later menu or
//! rate changes never touch placed orders. The quantity is stored once on the line; unit
//! prices are never pre-multiplied.
//!
//! `total = subtotal + service_fee`. The `tax` column is informational: it is already
//! contained in the tax-inclusive subtotal.

use crate::{
    core::{
        customization::{self, Customization, SelectedOptions},
        menu, money,
        period::DateRange,
        tax_rate::{self, TaxRates},
    },
    entities::{Order, menu_category, menu_item, order},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::{info, warn};

/// Upper bound on a single line's quantity
const MAX_QUANTITY: i32 = 999;

/// Checkouts racing for the same daily number retry this many times
const MAX_NUMBERING_ATTEMPTS: u32 = 3;

/// Order lifecycle states. Only `Completed` orders are counted in tax reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    /// Placed, not yet seen by staff
    Pending,
    /// Accepted by staff
    Confirmed,
    /// In the kitchen
    Preparing,
    /// Ready for pickup
    Ready,
    /// Handed over and paid
    Completed,
    /// Cancelled by staff or customer
    Cancelled,
}

impl OrderStatus {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "preparing" => Ok(Self::Preparing),
            "ready" => Ok(Self::Ready),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(Error::InvalidStatus {
                status: other.to_string(),
            }),
        }
    }
}

/// One line of a placed order, as stored in `orders.items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Units ordered, at least 1
    pub quantity: i32,
    /// Item name at order time
    pub name: String,
    /// Tax-inclusive unit price at order time
    pub price: Decimal,
    /// Pre-tax unit price
    #[serde(default)]
    pub base_price: Option<Decimal>,
    /// Effective rate at order time
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    /// Tax contained in one unit
    #[serde(default)]
    pub tax_amount: Option<Decimal>,
    /// Menu item the line was built from; lookup only
    #[serde(default)]
    pub menu_item_id: Option<i64>,
    /// Chosen options and their price modifiers
    #[serde(default)]
    pub customizations: Option<Customization>,
}

impl OrderItem {
    /// `price × quantity`
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Tax contained in the line at the given rate, unrounded
    #[must_use]
    pub fn line_tax(&self, rate: Decimal) -> Decimal {
        money::tax_from_final_price(self.line_total(), rate)
    }
}

/// Tax of one order, split by rate label.
///
/// Each rate's share is rounded to cents once per order, and the order's tax is the sum of
/// those shares. Reports add these cent amounts, so a period's total equals the sum of its
/// sub-periods and the breakdown always adds up to the total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderTax {
    /// Sum of tax-inclusive line totals
    pub gross: Decimal,
    /// Tax contained in `gross`
    pub tax: Decimal,
    /// Tax per rate label (`"13.5%"`)
    pub by_rate: BTreeMap<String, Decimal>,
}

impl OrderTax {
    /// The rate label with the largest tax share; ties go to the first label in order.
    #[must_use]
    pub fn dominant_rate(&self) -> Option<&str> {
        let mut dominant: Option<(&String, Decimal)> = None;
        for (label, amount) in &self.by_rate {
            if dominant.is_none_or(|(_, best)| *amount > best) {
                dominant = Some((label, *amount));
            }
        }
        dominant.map(|(label, _)| label.as_str())
    }
}

/// Computes an order's tax from its lines and the rate that applies to each.
pub fn summarize_lines<'a, I>(lines: I) -> OrderTax
where
    I: IntoIterator<Item = (&'a OrderItem, Decimal)>,
{
    let mut gross = Decimal::ZERO;
    let mut unrounded: BTreeMap<String, Decimal> = BTreeMap::new();
    for (item, rate) in lines {
        gross += item.line_total();
        *unrounded.entry(money::rate_label(rate)).or_default() += item.line_tax(rate);
    }

    let by_rate: BTreeMap<String, Decimal> = unrounded
        .into_iter()
        .map(|(label, tax)| (label, money::round_money(tax)))
        .collect();
    OrderTax {
        gross,
        tax: by_rate.values().copied().sum(),
        by_rate,
    }
}

/// Builds a tax-annotated order line from a menu item.
///
/// The unit price is the item's tax-inclusive price plus any customization modifiers. The
/// base price and unit tax are derived from it with the item's effective rate and always
/// add up to the unit price.
///
/// # Errors
/// Returns `InvalidQuantity` for quantities outside `1..=999` and `InvalidAmount` if
/// customizations would make the unit price negative.
pub fn build_order_item(
    rates: &TaxRates,
    item: &menu_item::Model,
    category: Option<&menu_category::Model>,
    quantity: i32,
    customizations: Option<Customization>,
) -> Result<OrderItem> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(Error::InvalidQuantity { quantity });
    }

    let rate = tax_rate::resolve_tax_rate(rates, item, category);
    let modifiers = customizations
        .as_ref()
        .map_or(Decimal::ZERO, Customization::price_modifier_total);
    let price = money::round_money(money::to_decimal(item.price) + modifiers);
    money::validate_amount(price)?;

    let (base_price, tax_amount) = money::split_final_price(price, rate);

    Ok(OrderItem {
        quantity,
        name: item.name.clone(),
        price,
        base_price: Some(base_price),
        tax_rate: Some(rate),
        tax_amount: Some(tax_amount),
        menu_item_id: Some(item.id),
        customizations: customizations.filter(|c| !c.choices.is_empty()),
    })
}

/// A line in the customer's cart.
#[derive(Debug, Clone, Default)]
pub struct CartLine {
    /// Menu item to order
    pub menu_item_id: i64,
    /// Units
    pub quantity: i32,
    /// Chosen options per group
    pub options: SelectedOptions,
}

/// Checkout input.
#[derive(Debug, Clone, Default)]
pub struct NewOrder {
    /// Customer name
    pub customer_name: String,
    /// Optional contact email
    pub customer_email: Option<String>,
    /// Optional contact phone
    pub customer_phone: Option<String>,
    /// Cart contents
    pub lines: Vec<CartLine>,
}

/// Loads a menu item and its category and builds the order line for it.
///
/// # Errors
/// Returns `MenuItemNotFound` if the item does not exist or is not available, and the
/// selection or quantity errors of [`customization::validate_selection`] and
/// [`build_order_item`].
pub async fn build_cart_line<C>(db: &C, rates: &TaxRates, line: &CartLine) -> Result<OrderItem>
where
    C: ConnectionTrait,
{
    let item = menu::get_menu_item(db, line.menu_item_id)
        .await?
        .filter(|item| item.is_available)
        .ok_or(Error::MenuItemNotFound {
            id: line.menu_item_id,
        })?;
    let category = menu::get_category(db, item.category_id).await?;
    let groups = customization::decode_option_groups(&item)?;
    let customizations = customization::validate_selection(&groups, &line.options)?;

    build_order_item(
        rates,
        &item,
        category.as_ref(),
        line.quantity,
        Some(customizations),
    )
}

/// Places an order now. See [`place_order_at`].
pub async fn place_order(
    db: &DatabaseConnection,
    rates: &TaxRates,
    service_fee: Decimal,
    new_order: NewOrder,
) -> Result<order::Model> {
    place_order_at(db, rates, service_fee, new_order, Utc::now()).await
}

/// Places an order with an explicit creation time.
///
/// All lines are built and priced, then the order is inserted with the next daily number
/// of its UTC day inside one database transaction. A unique index on the day and number
/// backs the numbering; a checkout that loses the race retries with a fresh number.
///
/// # Errors
/// Returns an error if the customer name or cart is empty, any line is invalid, or a
/// database operation fails. Nothing is stored on error.
pub async fn place_order_at(
    db: &DatabaseConnection,
    rates: &TaxRates,
    service_fee: Decimal,
    new_order: NewOrder,
    created_at: DateTime<Utc>,
) -> Result<order::Model> {
    if new_order.customer_name.trim().is_empty() {
        return Err(Error::InvalidSelection {
            message: "Customer name cannot be empty".to_string(),
        });
    }
    if new_order.lines.is_empty() {
        return Err(Error::InvalidSelection {
            message: "An order needs at least one item".to_string(),
        });
    }
    money::validate_amount(service_fee)?;

    let mut items = Vec::with_capacity(new_order.lines.len());
    for line in &new_order.lines {
        items.push(build_cart_line(db, rates, line).await?);
    }

    let order_tax = summarize_lines(
        items
            .iter()
            .map(|item| (item, item.tax_rate.unwrap_or(rates.default_rate()))),
    );
    let subtotal = order_tax.gross;
    let total = subtotal + service_fee;
    let order_date = created_at.date_naive();
    let items_json = serde_json::to_string(&items)?;

    let mut attempt = 0;
    let inserted = loop {
        attempt += 1;
        let txn = db.begin().await?;
        let daily_number = next_daily_number(&txn, order_date).await?;

        let model = order::ActiveModel {
            customer_name: Set(new_order.customer_name.trim().to_string()),
            customer_email: Set(new_order.customer_email.clone()),
            customer_phone: Set(new_order.customer_phone.clone()),
            order_date: Set(order_date),
            daily_number: Set(daily_number),
            subtotal: Set(money::to_f64(subtotal)),
            service_fee: Set(money::to_f64(service_fee)),
            tax: Set(money::to_f64(order_tax.tax)),
            total: Set(money::to_f64(total)),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            items: Set(items_json.clone()),
            created_at: Set(created_at),
            updated_at: Set(created_at),
            ..Default::default()
        };

        match model.insert(&txn).await {
            Ok(inserted) => {
                txn.commit().await?;
                break inserted;
            }
            Err(e)
                if attempt < MAX_NUMBERING_ATTEMPTS
                    && matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
            {
                warn!(%order_date, daily_number, "Daily number taken, retrying");
                txn.rollback().await?;
            }
            Err(e) => return Err(e.into()),
        }
    };

    info!(
        order_id = inserted.id,
        daily_number = inserted.daily_number,
        total = %money::format_money(total),
        "Order placed"
    );
    Ok(inserted)
}

/// Next free daily number for `order_date`, one past the highest already assigned.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn next_daily_number<C>(db: &C, order_date: NaiveDate) -> Result<i32>
where
    C: ConnectionTrait,
{
    let highest: Option<i32> = Order::find()
        .select_only()
        .column_as(order::Column::DailyNumber.max(), "highest")
        .filter(order::Column::OrderDate.eq(order_date))
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?
        .flatten();
    Ok(highest.map_or(1, |n| n.saturating_add(1)))
}

/// Decodes the line items stored on an order.
///
/// # Errors
/// Returns a serialization error if `items` is not a valid line item list.
pub fn decode_items(order: &order::Model) -> Result<Vec<OrderItem>> {
    serde_json::from_str(&order.items).map_err(Into::into)
}

/// Retrieves an order by id.
pub async fn get_order<C>(db: &C, order_id: i64) -> Result<Option<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id).one(db).await.map_err(Into::into)
}

/// Lists orders created within `range`, optionally with one status, oldest first.
pub async fn list_orders<C>(
    db: &C,
    range: &DateRange,
    status: Option<OrderStatus>,
) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    let mut query =
        Order::find().filter(order::Column::CreatedAt.between(range.start(), range.end()));
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status.as_str()));
    }
    query
        .order_by_asc(order::Column::CreatedAt)
        .order_by_asc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes an order's status. Financial fields are left untouched.
///
/// # Errors
/// Returns `OrderNotFound` if the order does not exist.
pub async fn update_order_status<C>(
    db: &C,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let mut active: order::ActiveModel = get_order(db, order_id)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?
        .into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::customization::{MenuOption, OptionGroup},
        test_utils::*,
    };

    fn d(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    fn burger() -> menu_item::Model {
        let now = utc(2025, 1, 1, 0).naive_utc();
        menu_item::Model {
            id: 3,
            name: "Burger".to_string(),
            category_id: 1,
            price: 11.49,
            base_price: Some(10.12),
            tax_rate: None,
            option_groups: None,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_build_order_item_snapshot() {
        let line = build_order_item(&TaxRates::default(), &burger(), None, 2, None).unwrap();

        assert_eq!(line.quantity, 2);
        assert_eq!(line.name, "Burger");
        assert_eq!(line.price, d(1149, 2));
        assert_eq!(line.base_price, Some(d(1012, 2)));
        assert_eq!(line.tax_amount, Some(d(137, 2)));
        assert_eq!(line.tax_rate, Some(d(135, 3)));
        assert_eq!(line.menu_item_id, Some(3));
        assert!(line.customizations.is_none());
        assert_eq!(line.line_total(), d(2298, 2));
    }

    #[test]
    fn test_build_order_item_adds_modifiers() {
        let customization = Customization {
            choices: vec![customization::ChosenOption {
                group: "Extras".to_string(),
                option: "Bacon".to_string(),
                price_modifier: d(200, 2),
            }],
        };
        let line =
            build_order_item(&TaxRates::default(), &burger(), None, 1, Some(customization))
                .unwrap();

        assert_eq!(line.price, d(1349, 2));
        assert_eq!(
            line.base_price.unwrap() + line.tax_amount.unwrap(),
            line.price
        );
        assert!(line.customizations.is_some());
    }

    #[test]
    fn test_build_order_item_rejects_bad_quantity() {
        for quantity in [0, -1, 1000] {
            let result = build_order_item(&TaxRates::default(), &burger(), None, quantity, None);
            assert!(matches!(result, Err(Error::InvalidQuantity { .. })));
        }
    }

    #[test]
    fn test_items_json_uses_camel_case() {
        let line = build_order_item(&TaxRates::default(), &burger(), None, 1, None).unwrap();
        let json = serde_json::to_string(&vec![line]).unwrap();
        assert!(json.contains("\"menuItemId\":3"));
        assert!(json.contains("\"taxRate\":0.135"));

        // Older snapshots carry only the required fields
        let legacy: Vec<OrderItem> =
            serde_json::from_str(r#"[{"quantity":1,"name":"Soup","price":5.5}]"#).unwrap();
        assert!(legacy[0].tax_rate.is_none());
        assert_eq!(legacy[0].price, d(55, 1));
    }

    #[test]
    fn test_summarize_lines_rounds_per_rate() {
        let food = OrderItem {
            quantity: 2,
            name: "Burger".to_string(),
            price: d(1149, 2),
            base_price: None,
            tax_rate: None,
            tax_amount: None,
            menu_item_id: None,
            customizations: None,
        };
        let drink = OrderItem {
            quantity: 1,
            name: "Wine".to_string(),
            price: d(1230, 2),
            ..food.clone()
        };

        let summary = summarize_lines([(&food, d(135, 3)), (&drink, d(23, 2))]);

        assert_eq!(summary.gross, d(3528, 2));
        assert_eq!(summary.by_rate["13.5%"], d(273, 2));
        assert_eq!(summary.by_rate["23.0%"], d(230, 2));
        assert_eq!(summary.tax, d(503, 2));
        assert_eq!(summary.dominant_rate(), Some("13.5%"));
    }

    #[test]
    fn test_dominant_rate_tie_takes_first_label() {
        let mut tax = OrderTax::default();
        tax.by_rate.insert("9.0%".to_string(), d(100, 2));
        tax.by_rate.insert("13.5%".to_string(), d(100, 2));
        assert_eq!(tax.dominant_rate(), Some("13.5%"));
        assert_eq!(OrderTax::default().dominant_rate(), None);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Completed".parse::<OrderStatus>().unwrap(), OrderStatus::Completed);
        assert!(matches!(
            "lost".parse::<OrderStatus>(),
            Err(Error::InvalidStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_place_order_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let mains = create_test_category(&db, "Mains", None).await?;
        let drinks = create_test_category(&db, "Drinks", Some(d(23, 2))).await?;
        let burger = create_test_menu_item(&db, "Burger", mains.id, d(1149, 2), None).await?;
        let wine = create_test_menu_item(&db, "Wine", drinks.id, d(1230, 2), None).await?;

        let placed = place_order_at(
            &db,
            &TaxRates::default(),
            d(50, 2),
            NewOrder {
                customer_name: "Ada".to_string(),
                lines: vec![cart_line(burger.id, 2), cart_line(wine.id, 1)],
                ..Default::default()
            },
            utc(2025, 1, 10, 12),
        )
        .await?;

        assert_eq!(placed.subtotal, 35.28);
        assert_eq!(placed.service_fee, 0.5);
        assert_eq!(placed.total, 35.78);
        assert_eq!(placed.tax, 5.03);
        assert_eq!(placed.status, "pending");
        assert_eq!(placed.daily_number, 1);

        let items = decode_items(&placed)?;
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].tax_rate, Some(d(23, 2)));
        Ok(())
    }

    #[tokio::test]
    async fn test_daily_number_restarts_each_day() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Mains", None).await?;
        let item = create_test_menu_item(&db, "Burger", category.id, d(1149, 2), None).await?;

        let first = place_test_order(&db, &[(item.id, 1)], utc(2025, 1, 10, 9)).await?;
        let second = place_test_order(&db, &[(item.id, 1)], utc(2025, 1, 10, 18)).await?;
        let next_day = place_test_order(&db, &[(item.id, 1)], utc(2025, 1, 11, 9)).await?;

        assert_eq!(first.daily_number, 1);
        assert_eq!(second.daily_number, 2);
        assert_eq!(next_day.daily_number, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_daily_number_is_unique_per_day() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Mains", None).await?;
        let item = create_test_menu_item(&db, "Burger", category.id, d(1149, 2), None).await?;
        let first = place_test_order(&db, &[(item.id, 1)], utc(2025, 1, 10, 9)).await?;

        let duplicate = order::ActiveModel {
            customer_name: Set("Racer".to_string()),
            customer_email: Set(None),
            customer_phone: Set(None),
            order_date: Set(first.order_date),
            daily_number: Set(first.daily_number),
            subtotal: Set(first.subtotal),
            service_fee: Set(first.service_fee),
            tax: Set(first.tax),
            total: Set(first.total),
            status: Set(first.status.clone()),
            items: Set(first.items.clone()),
            created_at: Set(first.created_at),
            updated_at: Set(first.created_at),
            ..Default::default()
        };
        let err = duplicate.insert(&db).await.unwrap_err();
        assert!(matches!(
            err.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));

        // Numbering continues after the highest number, not the row count
        assert_eq!(next_daily_number(&db, first.order_date).await?, 2);
        assert_eq!(
            next_daily_number(&db, first.order_date.succ_opt().unwrap()).await?,
            1
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_validates_options() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Mains", None).await?;
        let item = menu::create_menu_item(
            &db,
            &TaxRates::default(),
            menu::NewMenuItem {
                name: "Pizza".to_string(),
                category_id: category.id,
                price: d(1000, 2),
                tax_rate: None,
                option_groups: vec![OptionGroup {
                    id: "size".to_string(),
                    name: "Size".to_string(),
                    required: true,
                    max_selections: Some(1),
                    options: vec![MenuOption {
                        id: "large".to_string(),
                        name: "Large".to_string(),
                        price_modifier: d(300, 2),
                        available: true,
                    }],
                }],
            },
        )
        .await?;

        let missing_choice = place_test_order(&db, &[(item.id, 1)], utc(2025, 1, 10, 9)).await;
        assert!(matches!(
            missing_choice,
            Err(Error::InvalidSelection { .. })
        ));

        let mut line = cart_line(item.id, 1);
        line.options
            .insert("size".to_string(), ["large".to_string()].into_iter().collect());
        let placed = place_order_at(
            &db,
            &TaxRates::default(),
            Decimal::ZERO,
            NewOrder {
                customer_name: "Ada".to_string(),
                lines: vec![line],
                ..Default::default()
            },
            utc(2025, 1, 10, 9),
        )
        .await?;
        assert_eq!(placed.total, 13.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_now_requires_customer() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Mains", None).await?;
        let item = create_test_menu_item(&db, "Burger", category.id, d(1149, 2), None).await?;

        let anonymous = NewOrder {
            customer_name: "  ".to_string(),
            lines: vec![cart_line(item.id, 1)],
            ..Default::default()
        };
        let result = place_order(&db, &TaxRates::default(), Decimal::ZERO, anonymous).await;
        assert!(matches!(result, Err(Error::InvalidSelection { .. })));

        let placed = place_order(
            &db,
            &TaxRates::default(),
            Decimal::ZERO,
            NewOrder {
                customer_name: "Grace".to_string(),
                lines: vec![cart_line(item.id, 1)],
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(placed.daily_number, 1);
        assert_eq!(placed.total, 11.49);
        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_unknown_item_stores_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let result = place_test_order(&db, &[(99, 1)], utc(2025, 1, 10, 9)).await;
        assert!(matches!(result, Err(Error::MenuItemNotFound { id: 99 })));

        let day = utc(2025, 1, 10, 0).date_naive();
        let range = DateRange::days(day, day)?;
        assert!(list_orders(&db, &range, None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshots_survive_menu_changes() -> Result<()> {
        let db = setup_test_db().await?;
        let rates = TaxRates::default();
        let category = create_test_category(&db, "Mains", None).await?;
        let item = create_test_menu_item(&db, "Burger", category.id, d(1149, 2), None).await?;
        let placed = place_test_order(&db, &[(item.id, 1)], utc(2025, 1, 10, 9)).await?;

        menu::apply_price_edit(&db, &rates, item.id, menu::PriceEdit::DisplayPrice(d(1500, 2)))
            .await?;
        menu::update_category_tax_rate(&db, category.id, Some(d(2, 1))).await?;

        let stored = get_order(&db, placed.id).await?.unwrap();
        let items = decode_items(&stored)?;
        assert_eq!(items[0].price, d(1149, 2));
        assert_eq!(items[0].tax_rate, Some(d(135, 3)));
        assert_eq!(stored.total, 11.49);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_and_filtered_listing() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Mains", None).await?;
        let item = create_test_menu_item(&db, "Burger", category.id, d(1149, 2), None).await?;
        let placed = place_test_order(&db, &[(item.id, 1)], utc(2025, 1, 10, 9)).await?;
        place_test_order(&db, &[(item.id, 1)], utc(2025, 1, 10, 10)).await?;

        let updated = update_order_status(&db, placed.id, OrderStatus::Completed).await?;
        assert_eq!(updated.status, "completed");
        assert_eq!(updated.total, placed.total);

        let day = utc(2025, 1, 10, 0).date_naive();
        let range = DateRange::days(day, day)?;
        let completed = list_orders(&db, &range, Some(OrderStatus::Completed)).await?;
        assert_eq!(completed.len(), 1);
        assert_eq!(list_orders(&db, &range, None).await?.len(), 2);

        let missing = update_order_status(&db, 404, OrderStatus::Ready).await;
        assert!(matches!(missing, Err(Error::OrderNotFound { id: 404 })));
        Ok(())
    }
}
