//! Scheduled report generation for finished periods.
//!
//! Once a day, month or year has ended its report is generated one final time. The last
//! generated period key per report type is kept in the `system_state` table, so each
//! finished period is generated once no matter how often the check runs.

use crate::{
    config::settings::ReportSettings,
    core::{
        money,
        period::{ReportPeriod, ReportType},
        report,
        tax_rate::TaxRates,
    },
    entities::{SystemState, system_state},
    errors::Result,
};
use chrono::{Days, NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::time::Duration;
use tracing::{error, info, warn};

/// `system_state` key holding the last generated period of a report type.
#[must_use]
pub fn state_key(report_type: ReportType) -> String {
    format!("last_{report_type}_report")
}

/// One report written by a rollover run.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    /// Period that was generated
    pub period: ReportPeriod,
    /// Orders counted
    pub total_orders: i64,
    /// Tax collected
    pub total_tax_collected: f64,
}

/// Outcome of one rollover check.
#[derive(Debug, Clone)]
pub struct RolloverResult {
    /// The day the check ran for
    pub run_date: NaiveDate,
    /// Reports generated, daily first
    pub generated: Vec<GeneratedReport>,
}

/// Reads the last generated period key of a report type.
pub async fn get_last_generated<C>(db: &C, report_type: ReportType) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(state_key(report_type)))
        .one(db)
        .await?;
    Ok(state.map(|s| s.value))
}

async fn set_last_generated<C>(db: &C, report_type: ReportType, period_key: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let key = state_key(report_type);
    let now = Utc::now().naive_utc();

    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(key.clone()))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(period_key.to_string());
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = system_state::ActiveModel {
            key: Set(key),
            value: Set(period_key.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Generates every finished day, month and year report that has not been generated yet.
///
/// Each type resumes after its last generated period, so periods missed while the job was
/// not running are filled in, oldest first. The first run only generates the period that
/// just ended. Backfill reaches back at most `max_range_days` days.
///
/// Each report and its bookkeeping row are written in one transaction.
///
/// # Errors
/// Returns an error if a database operation fails; reports written before the failure stay.
pub async fn process_rollover(
    db: &DatabaseConnection,
    rates: &TaxRates,
    settings: &ReportSettings,
    today: NaiveDate,
) -> Result<RolloverResult> {
    let mut generated = Vec::new();

    for report_type in ReportType::ALL {
        let latest = ReportPeriod::containing(report_type, today).previous()?;
        let mut pending = first_pending(db, report_type, latest, settings).await?;

        while pending.first_day()? <= latest.first_day()? {
            let key = pending.key();
            let txn = db.begin().await?;
            let stored = report::generate_report(&txn, rates, settings, &pending).await?;
            set_last_generated(&txn, report_type, &key).await?;
            txn.commit().await?;

            generated.push(GeneratedReport {
                period: pending,
                total_orders: stored.total_orders,
                total_tax_collected: stored.total_tax_collected,
            });
            pending = pending.next()?;
        }
    }

    Ok(RolloverResult {
        run_date: today,
        generated,
    })
}

/// The oldest period of a type still waiting for its final generation.
async fn first_pending<C>(
    db: &C,
    report_type: ReportType,
    latest: ReportPeriod,
    settings: &ReportSettings,
) -> Result<ReportPeriod>
where
    C: ConnectionTrait,
{
    let Some(last_key) = get_last_generated(db, report_type).await? else {
        return Ok(latest);
    };
    let pending = match ReportPeriod::parse(report_type, &last_key) {
        Ok(last) => last.next()?,
        Err(e) => {
            warn!(%report_type, key = %last_key, "Unreadable rollover state: {e}");
            return Ok(latest);
        }
    };

    let earliest = latest
        .last_day()?
        .checked_sub_days(Days::new(settings.max_range_days.unsigned_abs()))
        .map(|day| ReportPeriod::containing(report_type, day));
    match earliest {
        Some(earliest) if pending.first_day()? < earliest.first_day()? => {
            warn!(
                %report_type,
                from = %pending.key(),
                to = %earliest.key(),
                "Rollover gap exceeds the backfill limit, skipping older periods"
            );
            Ok(earliest)
        }
        _ => Ok(pending),
    }
}

/// Formats a rollover result for the log.
///
/// # Errors
/// Returns a formatting error if writing to the summary fails.
pub fn format_rollover_summary(result: &RolloverResult) -> Result<String> {
    use std::fmt::Write;

    if result.generated.is_empty() {
        return Ok(format!(
            "Report rollover {} - nothing to generate",
            result.run_date
        ));
    }

    let mut summary = format!(
        "Report rollover {} - generated {} report(s)\n",
        result.run_date,
        result.generated.len()
    );
    for report in &result.generated {
        writeln!(
            summary,
            "  {}: {} orders, {} tax",
            report.period,
            report.total_orders,
            money::format_money(money::to_decimal(report.total_tax_collected))
        )?;
    }
    Ok(summary)
}

/// Runs the rollover check forever at the configured interval.
///
/// Failures are logged and retried at the next tick.
pub async fn run_rollover_loop(db: DatabaseConnection, rates: TaxRates, settings: ReportSettings) {
    let mut interval =
        tokio::time::interval(Duration::from_secs(settings.rollover_interval_secs.max(1)));

    loop {
        interval.tick().await;
        let today = Utc::now().date_naive();

        match process_rollover(&db, &rates, &settings, today).await {
            Ok(result) if result.generated.is_empty() => {}
            Ok(result) => match format_rollover_summary(&result) {
                Ok(summary) => info!("{summary}"),
                Err(e) => error!("Failed to format rollover summary: {e}"),
            },
            Err(e) => error!("Report rollover failed: {e}"),
        }
    }
}
