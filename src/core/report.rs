//! Tax report generation and storage.
//!
//! A report is the aggregate of one calendar period, computed fully in memory and then
//! written with a single `INSERT ... ON CONFLICT DO UPDATE` keyed on
//! `(report_type, report_date)`. Regenerating a period therefore updates its row in place,
//! and two concurrent regenerations of the same period cannot produce a duplicate.

use crate::{
    config::settings::ReportSettings,
    core::{
        aggregation::{
            self, AggregateOptions, OrderTaxDetail, TaxBreakdownEntry, TaxCalculationResult,
        },
        money,
        period::{ReportPeriod, ReportType},
        tax_rate::TaxRates,
    },
    entities::{TaxReport, tax_report},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// A fully computed report, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxReportData {
    /// Period the report covers
    pub period: ReportPeriod,
    /// Orders counted
    pub total_orders: i64,
    /// Tax collected
    pub total_tax_collected: Decimal,
    /// Revenue excluding tax
    pub total_pre_tax_revenue: Decimal,
    /// Revenue including tax
    pub total_inc_tax_revenue: Decimal,
    /// Average tax per order
    pub average_tax_per_order: Decimal,
    /// Average order value
    pub average_order_value: Decimal,
    /// Tax per rate label
    pub tax_breakdown: BTreeMap<String, TaxBreakdownEntry>,
    /// Per-order details, if collected
    pub order_details: Option<Vec<OrderTaxDetail>>,
}

impl TaxReportData {
    /// Wraps an aggregation result for the given period.
    #[must_use]
    pub fn from_result(period: ReportPeriod, result: TaxCalculationResult) -> Self {
        Self {
            period,
            total_orders: result.total_orders,
            total_tax_collected: result.total_tax_collected,
            total_pre_tax_revenue: result.total_pre_tax_revenue,
            total_inc_tax_revenue: result.total_inc_tax_revenue,
            average_tax_per_order: result.average_tax_per_order,
            average_order_value: result.average_order_value,
            tax_breakdown: result.tax_breakdown,
            order_details: result.order_details,
        }
    }

    fn into_active_model(self) -> Result<tax_report::ActiveModel> {
        let now = Utc::now();
        let to_i32 = |value: u32| i32::try_from(value).unwrap_or_default();
        let order_details = self
            .order_details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        Ok(tax_report::ActiveModel {
            report_type: Set(self.period.report_type().as_str().to_string()),
            report_date: Set(self.period.key()),
            year: Set(self.period.calendar_year()),
            month: Set(self.period.calendar_month().map(to_i32)),
            day: Set(self.period.calendar_day().map(to_i32)),
            total_tax_collected: Set(money::to_f64(self.total_tax_collected)),
            total_pre_tax_revenue: Set(money::to_f64(self.total_pre_tax_revenue)),
            total_inc_tax_revenue: Set(money::to_f64(self.total_inc_tax_revenue)),
            total_orders: Set(self.total_orders),
            average_tax_per_order: Set(money::to_f64(self.average_tax_per_order)),
            average_order_value: Set(money::to_f64(self.average_order_value)),
            tax_breakdown: Set(serde_json::to_string(&self.tax_breakdown)?),
            order_details: Set(order_details),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        })
    }
}

/// Inserts the report for its period, or overwrites every aggregate field of the existing
/// one. `created_at` of an existing row is kept.
///
/// # Errors
/// Returns an error if encoding or the database write fails.
pub async fn upsert_report<C>(db: &C, data: TaxReportData) -> Result<tax_report::Model>
where
    C: ConnectionTrait,
{
    let period = data.period;
    let active = data.into_active_model()?;

    TaxReport::insert(active)
        .on_conflict(
            OnConflict::columns([
                tax_report::Column::ReportType,
                tax_report::Column::ReportDate,
            ])
            .update_columns([
                tax_report::Column::Year,
                tax_report::Column::Month,
                tax_report::Column::Day,
                tax_report::Column::TotalTaxCollected,
                tax_report::Column::TotalPreTaxRevenue,
                tax_report::Column::TotalIncTaxRevenue,
                tax_report::Column::TotalOrders,
                tax_report::Column::AverageTaxPerOrder,
                tax_report::Column::AverageOrderValue,
                tax_report::Column::TaxBreakdown,
                tax_report::Column::OrderDetails,
                tax_report::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    get_report(db, &period).await
}

/// Looks up the report for a type and period key.
pub async fn find_report<C>(
    db: &C,
    report_type: ReportType,
    report_date: &str,
) -> Result<Option<tax_report::Model>>
where
    C: ConnectionTrait,
{
    TaxReport::find()
        .filter(tax_report::Column::ReportType.eq(report_type.as_str()))
        .filter(tax_report::Column::ReportDate.eq(report_date))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the stored report of a period.
///
/// # Errors
/// Returns `ReportNotFound` if the period has not been generated.
pub async fn get_report<C>(db: &C, period: &ReportPeriod) -> Result<tax_report::Model>
where
    C: ConnectionTrait,
{
    find_report(db, period.report_type(), &period.key())
        .await?
        .ok_or_else(|| Error::ReportNotFound {
            report_type: period.report_type().to_string(),
            report_date: period.key(),
        })
}

/// Lists stored reports of one type within a year, optionally narrowed to a month, in
/// period order.
pub async fn list_reports<C>(
    db: &C,
    report_type: ReportType,
    year: i32,
    month: Option<u32>,
) -> Result<Vec<tax_report::Model>>
where
    C: ConnectionTrait,
{
    let mut query = TaxReport::find()
        .filter(tax_report::Column::ReportType.eq(report_type.as_str()))
        .filter(tax_report::Column::Year.eq(year));
    if let Some(month) = month {
        query = query.filter(tax_report::Column::Month.eq(i32::try_from(month).unwrap_or(0)));
    }
    query
        .order_by_asc(tax_report::Column::ReportDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Aggregates the completed orders of a period and stores the result.
///
/// Daily reports carry per-order details; monthly and yearly reports only totals.
///
/// # Errors
/// Returns an error if the period is not representable or a database operation fails.
#[instrument(skip_all, fields(period = %period))]
pub async fn generate_report<C>(
    db: &C,
    rates: &TaxRates,
    settings: &ReportSettings,
    period: &ReportPeriod,
) -> Result<tax_report::Model>
where
    C: ConnectionTrait,
{
    let mut options = AggregateOptions::completed().with_page_size(settings.page_size);
    if period.report_type() == ReportType::Daily {
        options = options.with_details();
    }

    let result = aggregation::aggregate_period(db, rates, period, options).await?;
    let report = upsert_report(db, TaxReportData::from_result(*period, result)).await?;

    info!(
        orders = report.total_orders,
        tax = report.total_tax_collected,
        "Tax report generated"
    );
    Ok(report)
}

/// Aggregates completed orders over an arbitrary span of UTC days without storing a report.
///
/// # Errors
/// Returns `InvalidRange` for a reversed range, `RangeTooLarge` when the span exceeds
/// `reports.max_range_days`, or a database error.
pub async fn summarize_range<C>(
    db: &C,
    rates: &TaxRates,
    settings: &ReportSettings,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<TaxCalculationResult>
where
    C: ConnectionTrait,
{
    let options = AggregateOptions::completed().with_page_size(settings.page_size);
    aggregation::aggregate_days(db, rates, first, last, settings.max_range_days, options).await
}

/// Returns the reports shown for a period.
///
/// With `regenerate_on_read` the period is generated first so the result reflects the
/// current orders; otherwise only an already stored report is returned.
///
/// # Errors
/// Returns an error if generation or the lookup fails.
pub async fn read_reports<C>(
    db: &C,
    rates: &TaxRates,
    settings: &ReportSettings,
    period: &ReportPeriod,
) -> Result<Vec<tax_report::Model>>
where
    C: ConnectionTrait,
{
    if settings.regenerate_on_read {
        return Ok(vec![generate_report(db, rates, settings, period).await?]);
    }
    Ok(find_report(db, period.report_type(), &period.key())
        .await?
        .into_iter()
        .collect())
}

/// The period a stored report covers.
///
/// # Errors
/// Returns an error if the stored type or key is malformed.
pub fn report_period(report: &tax_report::Model) -> Result<ReportPeriod> {
    let report_type: ReportType = report.report_type.parse()?;
    ReportPeriod::parse(report_type, &report.report_date)
}

/// Decodes a stored tax breakdown.
///
/// # Errors
/// Returns a serialization error for malformed JSON.
pub fn decode_breakdown(report: &tax_report::Model) -> Result<BTreeMap<String, TaxBreakdownEntry>> {
    serde_json::from_str(&report.tax_breakdown).map_err(Into::into)
}

/// Decodes stored order details, if the report carries any.
///
/// # Errors
/// Returns a serialization error for malformed JSON.
pub fn decode_order_details(report: &tax_report::Model) -> Result<Option<Vec<OrderTaxDetail>>> {
    report
        .order_details
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(Into::into)
}

/// Formats a stored report for display.
///
/// # Errors
/// Returns an error if the stored breakdown cannot be decoded.
pub fn format_report_summary(report: &tax_report::Model) -> Result<String> {
    use std::fmt::Write;

    let mut summary = format!(
        "**{} report {}**\n",
        capitalize(&report.report_type),
        report.report_date
    );

    if report.total_orders == 0 {
        summary.push_str("No data for this period.\n");
        return Ok(summary);
    }

    writeln!(summary, "Orders: {}", report.total_orders)?;
    writeln!(
        summary,
        "Revenue (inc. tax): {}",
        money::format_money(money::to_decimal(report.total_inc_tax_revenue))
    )?;
    writeln!(
        summary,
        "Revenue (pre-tax): {}",
        money::format_money(money::to_decimal(report.total_pre_tax_revenue))
    )?;
    writeln!(
        summary,
        "Tax collected: {}",
        money::format_money(money::to_decimal(report.total_tax_collected))
    )?;
    writeln!(
        summary,
        "Avg tax/order: {} | Avg order value: {}",
        money::format_money(money::to_decimal(report.average_tax_per_order)),
        money::format_money(money::to_decimal(report.average_order_value))
    )?;

    let breakdown = decode_breakdown(report)?;
    if !breakdown.is_empty() {
        summary.push_str("\nBy rate:\n");
        for (label, entry) in &breakdown {
            writeln!(
                summary,
                "  {label}: {} ({} orders)",
                money::format_money(entry.amount),
                entry.orders
            )?;
        }
    }

    Ok(summary)
}

/// Formats an ad hoc range aggregation for display.
///
/// # Errors
/// Returns a formatting error if writing to the summary fails.
pub fn format_range_summary(
    first: NaiveDate,
    last: NaiveDate,
    result: &TaxCalculationResult,
) -> Result<String> {
    use std::fmt::Write;

    let mut summary = format!("**Tax summary {first} to {last}**\n");
    if result.is_empty() {
        summary.push_str("No data for this period.\n");
        return Ok(summary);
    }

    writeln!(summary, "Orders: {}", result.total_orders)?;
    writeln!(
        summary,
        "Revenue (inc. tax): {} | Pre-tax: {} | Tax: {}",
        money::format_money(result.total_inc_tax_revenue),
        money::format_money(result.total_pre_tax_revenue),
        money::format_money(result.total_tax_collected)
    )?;
    for (label, entry) in &result.tax_breakdown {
        writeln!(
            summary,
            "  {label}: {} ({} orders)",
            money::format_money(entry.amount),
            entry.orders
        )?;
    }
    if result.skipped_orders > 0 {
        writeln!(summary, "{} unreadable order(s) left out", result.skipped_orders)?;
    }
    Ok(summary)
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
