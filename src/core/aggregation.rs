//! Order aggregation - tax and revenue totals over a date range.
//!
//! Orders are reconciled from their line-item snapshots. A line's rate is the one captured
//! at checkout; lines stored without a rate get a fresh lookup through the menu
//! (item, then category, then default), and a menu item that no longer exists falls back
//! to the default rate. An order's tax-inclusive revenue is its stored `total`, and its
//! pre-tax revenue is that total minus the line tax.
//!
//! Orders are read page by page in `(created_at, id)` order so a long range never loads
//! every row at once. Only commutative sums cross order boundaries; the dominant rate of an
//! order is decided inside that order.

use crate::{
    core::{
        menu, money,
        order::{self, OrderItem, OrderStatus},
        period::{DateRange, ReportPeriod},
        tax_rate::TaxRates,
    },
    entities::{Order, order as order_entity},
    errors::Result,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Orders fetched per query unless configured otherwise
pub const DEFAULT_PAGE_SIZE: u64 = 500;

/// Options for [`aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Emit one [`OrderTaxDetail`] per counted order
    pub include_order_details: bool,
    /// Only count orders with this status
    pub status_filter: Option<OrderStatus>,
    /// Orders fetched per query
    pub page_size: u64,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            include_order_details: false,
            status_filter: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AggregateOptions {
    /// Completed orders only, the filter used for tax reports.
    #[must_use]
    pub fn completed() -> Self {
        Self {
            status_filter: Some(OrderStatus::Completed),
            ..Self::default()
        }
    }

    /// Also emit per-order details.
    #[must_use]
    pub const fn with_details(mut self) -> Self {
        self.include_order_details = true;
        self
    }

    /// Overrides the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Tax collected at one rate. Stored as `{"amount": 1.37, "orders": 1}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdownEntry {
    /// Tax collected at this rate
    pub amount: Decimal,
    /// Orders whose dominant rate is this one
    pub orders: i64,
}

/// Re-derived tax detail of one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTaxDetail {
    /// Item name at order time
    pub name: String,
    /// Units ordered
    pub quantity: i32,
    /// `unit price × quantity`
    pub line_total: Decimal,
    /// Tax contained in the line
    pub tax_amount: Decimal,
    /// Rate applied to the line
    pub tax_rate: Decimal,
}

/// Tax detail of one counted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTaxDetail {
    /// Order id
    pub id: i64,
    /// Customer name
    pub customer_name: String,
    /// Number within the order's day
    pub daily_number: i32,
    /// Stored order total
    pub total: Decimal,
    /// Tax contained in the order
    pub tax_amount: Decimal,
    /// `total - tax_amount`
    pub pre_tax_amount: Decimal,
    /// Status at aggregation time
    pub status: String,
    /// When the order was placed
    pub created_at: DateTime<Utc>,
    /// Per line detail
    pub items: Vec<ItemTaxDetail>,
}

/// Totals for one date range. Every currency field is rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxCalculationResult {
    /// The aggregated range
    pub range: DateRange,
    /// Orders counted
    pub total_orders: i64,
    /// Tax collected
    pub total_tax_collected: Decimal,
    /// Revenue excluding tax
    pub total_pre_tax_revenue: Decimal,
    /// Revenue including tax
    pub total_inc_tax_revenue: Decimal,
    /// `total_tax_collected / total_orders`, 0 without orders
    pub average_tax_per_order: Decimal,
    /// `total_inc_tax_revenue / total_orders`, 0 without orders
    pub average_order_value: Decimal,
    /// Tax per rate label
    pub tax_breakdown: BTreeMap<String, TaxBreakdownEntry>,
    /// Per-order details when requested
    pub order_details: Option<Vec<OrderTaxDetail>>,
    /// Orders left out because their items could not be decoded
    pub skipped_orders: u64,
}

impl TaxCalculationResult {
    /// True when no order was counted.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_orders == 0
    }
}

/// Resolves line rates, caching fresh menu lookups for the duration of one aggregation.
struct LineRates<'a, C> {
    db: &'a C,
    rates: &'a TaxRates,
    menu_rates: HashMap<i64, Decimal>,
}

impl<'a, C> LineRates<'a, C>
where
    C: ConnectionTrait,
{
    fn new(db: &'a C, rates: &'a TaxRates) -> Self {
        Self {
            db,
            rates,
            menu_rates: HashMap::new(),
        }
    }

    async fn rate_for(&mut self, item: &OrderItem) -> Result<Decimal> {
        if let Some(rate) = item.tax_rate {
            return Ok(rate);
        }
        let Some(menu_item_id) = item.menu_item_id else {
            return Ok(self.rates.default_rate());
        };
        if let Some(rate) = self.menu_rates.get(&menu_item_id) {
            return Ok(*rate);
        }

        let rate = match menu::get_menu_item(self.db, menu_item_id).await? {
            Some(menu_item) => menu::effective_rate(self.db, self.rates, &menu_item).await?,
            None => {
                warn!(
                    menu_item_id,
                    item = %item.name,
                    "Menu item no longer exists, using default tax rate"
                );
                self.rates.default_rate()
            }
        };
        self.menu_rates.insert(menu_item_id, rate);
        Ok(rate)
    }
}

#[derive(Default)]
struct Totals {
    orders: i64,
    tax: Decimal,
    pre_tax: Decimal,
    inc_tax: Decimal,
    breakdown: BTreeMap<String, TaxBreakdownEntry>,
    details: Vec<OrderTaxDetail>,
    skipped: u64,
}

impl Totals {
    fn finish(self, range: DateRange, include_details: bool) -> TaxCalculationResult {
        let average = |sum: Decimal| {
            if self.orders == 0 {
                Decimal::ZERO
            } else {
                money::round_money(sum / Decimal::from(self.orders))
            }
        };

        TaxCalculationResult {
            range,
            total_orders: self.orders,
            total_tax_collected: money::round_money(self.tax),
            total_pre_tax_revenue: money::round_money(self.pre_tax),
            total_inc_tax_revenue: money::round_money(self.inc_tax),
            average_tax_per_order: average(self.tax),
            average_order_value: average(self.inc_tax),
            tax_breakdown: self
                .breakdown
                .into_iter()
                .map(|(label, entry)| {
                    (
                        label,
                        TaxBreakdownEntry {
                            amount: money::round_money(entry.amount),
                            orders: entry.orders,
                        },
                    )
                })
                .collect(),
            order_details: include_details.then_some(self.details),
            skipped_orders: self.skipped,
        }
    }
}

/// Aggregates the orders created within `range`.
///
/// An order whose `items` cannot be decoded is logged, counted in `skipped_orders` and left
/// out of every sum.
///
/// # Errors
/// Returns an error only if a database query fails.
pub async fn aggregate<C>(
    db: &C,
    rates: &TaxRates,
    range: &DateRange,
    options: AggregateOptions,
) -> Result<TaxCalculationResult>
where
    C: ConnectionTrait,
{
    let mut query =
        Order::find().filter(order_entity::Column::CreatedAt.between(range.start(), range.end()));
    if let Some(status) = options.status_filter {
        query = query.filter(order_entity::Column::Status.eq(status.as_str()));
    }
    let mut pages = query
        .order_by_asc(order_entity::Column::CreatedAt)
        .order_by_asc(order_entity::Column::Id)
        .paginate(db, options.page_size.max(1));

    let mut line_rates = LineRates::new(db, rates);
    let mut totals = Totals::default();

    while let Some(orders) = pages.fetch_and_next().await? {
        debug!(count = orders.len(), "Aggregating page of orders");
        for row in orders {
            let items = match order::decode_items(&row) {
                Ok(items) => items,
                Err(e) => {
                    warn!(order_id = row.id, error = %e, "Skipping order with malformed items");
                    totals.skipped += 1;
                    continue;
                }
            };

            let mut lines = Vec::with_capacity(items.len());
            for item in &items {
                lines.push((item, line_rates.rate_for(item).await?));
            }
            let order_tax = order::summarize_lines(lines.iter().copied());

            let inc_tax = money::to_decimal(row.total);
            let pre_tax = inc_tax - order_tax.tax;

            totals.orders += 1;
            totals.tax += order_tax.tax;
            totals.pre_tax += pre_tax;
            totals.inc_tax += inc_tax;

            for (label, amount) in &order_tax.by_rate {
                totals.breakdown.entry(label.clone()).or_default().amount += *amount;
            }
            if let Some(label) = order_tax.dominant_rate() {
                totals.breakdown.entry(label.to_string()).or_default().orders += 1;
            }

            if options.include_order_details {
                totals.details.push(OrderTaxDetail {
                    id: row.id,
                    customer_name: row.customer_name.clone(),
                    daily_number: row.daily_number,
                    total: money::round_money(inc_tax),
                    tax_amount: order_tax.tax,
                    pre_tax_amount: money::round_money(pre_tax),
                    status: row.status.clone(),
                    created_at: row.created_at,
                    items: lines
                        .iter()
                        .map(|(item, rate)| ItemTaxDetail {
                            name: item.name.clone(),
                            quantity: item.quantity,
                            line_total: money::round_money(item.line_total()),
                            tax_amount: money::round_money(item.line_tax(*rate)),
                            tax_rate: *rate,
                        })
                        .collect(),
                });
            }
        }
    }

    if totals.skipped > 0 {
        warn!(
            skipped = totals.skipped,
            "Some orders were left out of the aggregation"
        );
    }
    Ok(totals.finish(*range, options.include_order_details))
}

/// Aggregates whole UTC days from `first` to `last`, rejecting reversed or oversized ranges.
///
/// # Errors
/// Returns `InvalidRange` if `first` is after `last`, `RangeTooLarge` if the range spans
/// more than `max_days`, or a database error.
pub async fn aggregate_days<C>(
    db: &C,
    rates: &TaxRates,
    first: NaiveDate,
    last: NaiveDate,
    max_days: i64,
    options: AggregateOptions,
) -> Result<TaxCalculationResult>
where
    C: ConnectionTrait,
{
    let range = DateRange::days(first, last)?;
    range.ensure_at_most(max_days)?;
    aggregate(db, rates, &range, options).await
}

/// Aggregates one calendar period.
pub async fn aggregate_period<C>(
    db: &C,
    rates: &TaxRates,
    period: &ReportPeriod,
    options: AggregateOptions,
) -> Result<TaxCalculationResult>
where
    C: ConnectionTrait,
{
    aggregate(db, rates, &period.range()?, options).await
}

/// Aggregates one UTC day.
pub async fn aggregate_day<C>(
    db: &C,
    rates: &TaxRates,
    date: NaiveDate,
    options: AggregateOptions,
) -> Result<TaxCalculationResult>
where
    C: ConnectionTrait,
{
    aggregate_period(db, rates, &ReportPeriod::Day(date), options).await
}

/// Aggregates one calendar month.
pub async fn aggregate_month<C>(
    db: &C,
    rates: &TaxRates,
    year: i32,
    month: u32,
    options: AggregateOptions,
) -> Result<TaxCalculationResult>
where
    C: ConnectionTrait,
{
    aggregate_period(db, rates, &ReportPeriod::month(year, month)?, options).await
}

/// Aggregates one calendar year.
pub async fn aggregate_year<C>(
    db: &C,
    rates: &TaxRates,
    year: i32,
    options: AggregateOptions,
) -> Result<TaxCalculationResult>
where
    C: ConnectionTrait,
{
    aggregate_period(db, rates, &ReportPeriod::year(year)?, options).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::Error, test_utils::*};

    fn d(units: i64, scale: u32) -> Decimal {
        Decimal::new(units, scale)
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[tokio::test]
    async fn test_zero_orders() -> Result<()> {
        let db = setup_test_db().await?;
        let result = aggregate_day(
            &db,
            &TaxRates::default(),
            date(2025, 1, 10),
            AggregateOptions::completed().with_details(),
        )
        .await?;

        assert!(result.is_empty());
        assert_eq!(result.total_tax_collected, Decimal::ZERO);
        assert_eq!(result.total_pre_tax_revenue, Decimal::ZERO);
        assert_eq!(result.total_inc_tax_revenue, Decimal::ZERO);
        assert_eq!(result.average_tax_per_order, Decimal::ZERO);
        assert_eq!(result.average_order_value, Decimal::ZERO);
        assert!(result.tax_breakdown.is_empty());
        assert_eq!(result.order_details, Some(Vec::new()));
        Ok(())
    }

    #[tokio::test]
    async fn test_completed_orders_on_one_day() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Mains", None).await?;
        let set_menu = create_test_menu_item(&db, "Set Menu", category.id, d(2000, 2), None).await?;
        let lunch = create_test_menu_item(&db, "Lunch", category.id, d(1500, 2), None).await?;

        complete_test_order(&db, &[(set_menu.id, 1)], utc(2025, 1, 10, 11)).await?;
        complete_test_order(&db, &[(lunch.id, 1)], utc(2025, 1, 10, 13)).await?;
        insert_raw_order(&db, "[]", 0.0, OrderStatus::Cancelled, utc(2025, 1, 10, 15)).await?;

        let result = aggregate_day(
            &db,
            &TaxRates::default(),
            date(2025, 1, 10),
            AggregateOptions::completed(),
        )
        .await?;

        assert_eq!(result.total_orders, 2);
        assert_eq!(result.total_inc_tax_revenue, d(3500, 2));
        assert_eq!(result.total_tax_collected, d(416, 2));
        assert_eq!(result.total_pre_tax_revenue, d(3084, 2));
        assert_eq!(result.average_tax_per_order, d(208, 2));
        assert_eq!(result.average_order_value, d(1750, 2));
        assert_eq!(
            result.tax_breakdown["13.5%"],
            TaxBreakdownEntry {
                amount: d(416, 2),
                orders: 2
            }
        );
        assert!(result.order_details.is_none());

        let everything = aggregate_day(
            &db,
            &TaxRates::default(),
            date(2025, 1, 10),
            AggregateOptions::default(),
        )
        .await?;
        assert_eq!(everything.total_orders, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_day_totals_add_up_to_range_total() -> Result<()> {
        let db = setup_test_db().await?;
        let rates = TaxRates::default();
        let mains = create_test_category(&db, "Mains", None).await?;
        let drinks = create_test_category(&db, "Drinks", Some(d(23, 2))).await?;
        let burger = create_test_menu_item(&db, "Burger", mains.id, d(1149, 2), None).await?;
        let wine = create_test_menu_item(&db, "Wine", drinks.id, d(1230, 2), None).await?;
        let soup = create_test_menu_item(&db, "Soup", mains.id, d(733, 2), Some(d(9, 2))).await?;

        complete_test_order(&db, &[(burger.id, 3), (wine.id, 1)], utc(2025, 1, 10, 0)).await?;
        complete_test_order(&db, &[(soup.id, 7)], utc(2025, 1, 10, 23)).await?;
        complete_test_order(&db, &[(wine.id, 2), (soup.id, 1)], utc(2025, 1, 11, 0)).await?;
        complete_test_order(&db, &[(burger.id, 1)], utc(2025, 1, 11, 12)).await?;

        let options = AggregateOptions::completed().with_page_size(1);
        let day_a = aggregate_day(&db, &rates, date(2025, 1, 10), options).await?;
        let day_b = aggregate_day(&db, &rates, date(2025, 1, 11), options).await?;
        let both = aggregate_days(&db, &rates, date(2025, 1, 10), date(2025, 1, 11), 366, options)
            .await?;

        assert_eq!(both.total_orders, 4);
        assert_eq!(
            day_a.total_tax_collected + day_b.total_tax_collected,
            both.total_tax_collected
        );
        assert_eq!(
            day_a.total_inc_tax_revenue + day_b.total_inc_tax_revenue,
            both.total_inc_tax_revenue
        );
        assert_eq!(
            day_a.total_pre_tax_revenue + day_b.total_pre_tax_revenue,
            both.total_pre_tax_revenue
        );

        let breakdown_sum: Decimal = both.tax_breakdown.values().map(|e| e.amount).sum();
        assert_eq!(breakdown_sum, both.total_tax_collected);
        let counted: i64 = both.tax_breakdown.values().map(|e| e.orders).sum();
        assert_eq!(counted, both.total_orders);
        Ok(())
    }

    #[tokio::test]
    async fn test_dominant_rate_counts_order_once() -> Result<()> {
        let db = setup_test_db().await?;
        let mains = create_test_category(&db, "Mains", None).await?;
        let drinks = create_test_category(&db, "Drinks", Some(d(23, 2))).await?;
        let burger = create_test_menu_item(&db, "Burger", mains.id, d(1149, 2), None).await?;
        let wine = create_test_menu_item(&db, "Wine", drinks.id, d(1230, 2), None).await?;

        // 2 x 11.49 at 13.5% carries 2.73 of tax, 12.30 at 23% carries 2.30
        complete_test_order(&db, &[(burger.id, 2), (wine.id, 1)], utc(2025, 1, 10, 12)).await?;

        let result = aggregate_day(
            &db,
            &TaxRates::default(),
            date(2025, 1, 10),
            AggregateOptions::completed().with_details(),
        )
        .await?;

        assert_eq!(result.tax_breakdown["13.5%"].amount, d(273, 2));
        assert_eq!(result.tax_breakdown["13.5%"].orders, 1);
        assert_eq!(result.tax_breakdown["23.0%"].amount, d(230, 2));
        assert_eq!(result.tax_breakdown["23.0%"].orders, 0);

        let details = result.order_details.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].tax_amount, d(503, 2));
        assert_eq!(details[0].pre_tax_amount, d(3025, 2));
        assert_eq!(details[0].daily_number, 1);
        assert_eq!(details[0].items[0].line_total, d(2298, 2));
        assert_eq!(details[0].items[1].tax_rate, d(23, 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_items_are_skipped() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Mains", None).await?;
        let item = create_test_menu_item(&db, "Set Menu", category.id, d(2000, 2), None).await?;

        complete_test_order(&db, &[(item.id, 1)], utc(2025, 1, 10, 11)).await?;
        insert_raw_order(&db, "not json", 50.0, OrderStatus::Completed, utc(2025, 1, 10, 12))
            .await?;
        insert_raw_order(
            &db,
            r#"{"quantity": 1}"#,
            50.0,
            OrderStatus::Completed,
            utc(2025, 1, 10, 13),
        )
        .await?;

        let result = aggregate_day(
            &db,
            &TaxRates::default(),
            date(2025, 1, 10),
            AggregateOptions::completed(),
        )
        .await?;

        assert_eq!(result.skipped_orders, 2);
        assert_eq!(result.total_orders, 1);
        assert_eq!(result.total_inc_tax_revenue, d(2000, 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_lines_without_rate_are_looked_up() -> Result<()> {
        let db = setup_test_db().await?;
        let drinks = create_test_category(&db, "Drinks", Some(d(23, 2))).await?;
        let wine = create_test_menu_item(&db, "Wine", drinks.id, d(1230, 2), None).await?;

        let legacy_wine = format!(
            r#"[{{"quantity":1,"name":"Wine","price":12.3,"menuItemId":{}}}]"#,
            wine.id
        );
        insert_raw_order(&db, &legacy_wine, 12.3, OrderStatus::Completed, utc(2025, 1, 10, 9))
            .await?;
        insert_raw_order(
            &db,
            r#"[{"quantity":2,"name":"Old Special","price":10.0,"menuItemId":999}]"#,
            20.0,
            OrderStatus::Completed,
            utc(2025, 1, 10, 10),
        )
        .await?;

        let result = aggregate_day(
            &db,
            &TaxRates::default(),
            date(2025, 1, 10),
            AggregateOptions::completed(),
        )
        .await?;

        assert_eq!(result.total_orders, 2);
        assert_eq!(result.tax_breakdown["23.0%"].amount, d(230, 2));
        assert_eq!(result.tax_breakdown["13.5%"].amount, d(238, 2));
        assert_eq!(result.total_tax_collected, d(468, 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_configured_default_rate_applies_to_unknown_items() -> Result<()> {
        let db = setup_test_db().await?;
        insert_raw_order(
            &db,
            r#"[{"quantity":1,"name":"Bread","price":10.0}]"#,
            10.0,
            OrderStatus::Completed,
            utc(2025, 3, 1, 9),
        )
        .await?;

        let rates = TaxRates::new(d(25, 2))?;
        let result = aggregate_month(&db, &rates, 2025, 3, AggregateOptions::completed()).await?;

        assert_eq!(result.tax_breakdown["25.0%"].amount, d(200, 2));
        assert_eq!(result.total_pre_tax_revenue, d(800, 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_boundaries_are_utc_days() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Mains", None).await?;
        let item = create_test_menu_item(&db, "Set Menu", category.id, d(2000, 2), None).await?;

        complete_test_order(&db, &[(item.id, 1)], utc(2024, 12, 31, 23)).await?;
        complete_test_order(&db, &[(item.id, 1)], utc(2025, 1, 1, 0)).await?;

        let rates = TaxRates::default();
        let y2024 = aggregate_year(&db, &rates, 2024, AggregateOptions::completed()).await?;
        let y2025 = aggregate_year(&db, &rates, 2025, AggregateOptions::completed()).await?;
        assert_eq!(y2024.total_orders, 1);
        assert_eq!(y2025.total_orders, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_range_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let rates = TaxRates::default();

        let reversed = aggregate_days(
            &db,
            &rates,
            date(2025, 1, 11),
            date(2025, 1, 10),
            366,
            AggregateOptions::default(),
        )
        .await;
        assert!(matches!(reversed, Err(Error::InvalidRange { .. })));

        let too_long = aggregate_days(
            &db,
            &rates,
            date(2024, 1, 1),
            date(2025, 6, 30),
            366,
            AggregateOptions::default(),
        )
        .await;
        assert!(matches!(too_long, Err(Error::RangeTooLarge { .. })));
        Ok(())
    }
}
