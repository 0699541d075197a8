//! Tax report Discord commands - `/tax_report daily|monthly|yearly|range|generate|export`.
//!
//! Reads regenerate the period first when `reports.regenerate_on_read` is set. Periods with
//! no counted orders are shown as "no data" rather than as an error.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::Context,
        core::{
            export,
            period::{ReportPeriod, ReportType},
            report,
        },
        entities::tax_report,
        errors::{Error, Result},
    };
    use chrono::NaiveDate;
    use poise::serenity_prelude as serenity;

    /// Report granularity offered as a slash command choice
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum ReportKind {
        #[name = "daily"]
        Daily,
        #[name = "monthly"]
        Monthly,
        #[name = "yearly"]
        Yearly,
    }

    impl From<ReportKind> for ReportType {
        fn from(kind: ReportKind) -> Self {
            match kind {
                ReportKind::Daily => Self::Daily,
                ReportKind::Monthly => Self::Monthly,
                ReportKind::Yearly => Self::Yearly,
            }
        }
    }

    fn parse_date(date: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| Error::InvalidRange {
            start: date.to_string(),
            end: date.to_string(),
        })
    }

    fn missing_argument(name: &str) -> Error {
        Error::InvalidSelection {
            message: format!("`{name}` is required for this report type"),
        }
    }

    /// Builds the period a `generate` request names.
    fn requested_period(
        kind: ReportKind,
        date: Option<&str>,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<ReportPeriod> {
        match kind {
            ReportKind::Daily => Ok(ReportPeriod::Day(parse_date(
                date.ok_or_else(|| missing_argument("date"))?,
            )?)),
            ReportKind::Monthly => ReportPeriod::month(
                year.ok_or_else(|| missing_argument("year"))?,
                month.ok_or_else(|| missing_argument("month"))?,
            ),
            ReportKind::Yearly => ReportPeriod::year(year.ok_or_else(|| missing_argument("year"))?),
        }
    }

    async fn show_reports(ctx: Context<'_>, period: &ReportPeriod) -> Result<()> {
        let data = ctx.data();
        let reports =
            report::read_reports(&data.database, &data.rates, &data.settings.reports, period)
                .await?;

        if reports.is_empty() {
            ctx.say(format!("No data for this period ({}).", period.key()))
                .await?;
            return Ok(());
        }

        let mut message = String::new();
        for stored in &reports {
            message.push_str(&report::format_report_summary(stored)?);
            message.push('\n');
        }
        ctx.say(message).await?;
        Ok(())
    }

    /// Parent command for tax reports.
    ///
    /// Groups the report subcommands; on its own it prints a short usage summary.
    #[poise::command(
        slash_command,
        subcommands(
            "tax_report_daily",
            "tax_report_monthly",
            "tax_report_yearly",
            "tax_report_range",
            "tax_report_generate",
            "tax_report_export"
        )
    )]
    pub async fn tax_report(ctx: Context<'_>) -> Result<()> {
        let help_text = "Tax report command. Available subcommands:\n\
            `/tax_report daily` - Show the report of one day\n\
            `/tax_report monthly` - Show the report of one month\n\
            `/tax_report yearly` - Show the report of one year\n\
            `/tax_report range` - Summarize any span of days without storing it\n\
            `/tax_report generate` - Regenerate and store a report\n\
            `/tax_report export` - Download stored reports as CSV";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows the tax report of one day.
    #[poise::command(slash_command, rename = "daily")]
    pub async fn tax_report_daily(
        ctx: Context<'_>,
        #[description = "Day in YYYY-MM-DD format (UTC)"] date: String,
    ) -> Result<()> {
        let period = ReportPeriod::Day(parse_date(&date)?);
        show_reports(ctx, &period).await
    }

    /// Shows the tax report of one month.
    #[poise::command(slash_command, rename = "monthly")]
    pub async fn tax_report_monthly(
        ctx: Context<'_>,
        #[description = "Year, e.g. 2025"] year: i32,
        #[description = "Month, 1-12"]
        #[min = 1]
        #[max = 12]
        month: u32,
    ) -> Result<()> {
        let period = ReportPeriod::month(year, month)?;
        show_reports(ctx, &period).await
    }

    /// Shows the tax report of one year.
    #[poise::command(slash_command, rename = "yearly")]
    pub async fn tax_report_yearly(
        ctx: Context<'_>,
        #[description = "Year, e.g. 2025"] year: i32,
    ) -> Result<()> {
        let period = ReportPeriod::year(year)?;
        show_reports(ctx, &period).await
    }

    /// Summarizes completed orders between two days, inclusive. Nothing is stored.
    #[poise::command(slash_command, rename = "range")]
    pub async fn tax_report_range(
        ctx: Context<'_>,
        #[description = "First day in YYYY-MM-DD format (UTC)"] start: String,
        #[description = "Last day in YYYY-MM-DD format (UTC)"] end: String,
    ) -> Result<()> {
        let first = parse_date(&start)?;
        let last = parse_date(&end)?;
        ctx.defer().await?;

        let data = ctx.data();
        let result = report::summarize_range(
            &data.database,
            &data.rates,
            &data.settings.reports,
            first,
            last,
        )
        .await?;
        ctx.say(report::format_range_summary(first, last, &result)?)
            .await?;
        Ok(())
    }

    /// Regenerates and stores the report of a period.
    #[poise::command(slash_command, rename = "generate")]
    pub async fn tax_report_generate(
        ctx: Context<'_>,
        #[description = "Report type"] kind: ReportKind,
        #[description = "Day in YYYY-MM-DD format (daily reports)"] date: Option<String>,
        #[description = "Year (monthly and yearly reports)"] year: Option<i32>,
        #[description = "Month, 1-12 (monthly reports)"] month: Option<u32>,
    ) -> Result<()> {
        let period = requested_period(kind, date.as_deref(), year, month)?;
        ctx.defer().await?;

        let data = ctx.data();
        let stored =
            report::generate_report(&data.database, &data.rates, &data.settings.reports, &period)
                .await?;

        ctx.say(format!(
            "✅ Report generated.\n{}",
            report::format_report_summary(&stored)?
        ))
        .await?;
        Ok(())
    }

    /// Exports stored reports of a year (optionally one month) as a CSV file.
    #[poise::command(slash_command, rename = "export")]
    pub async fn tax_report_export(
        ctx: Context<'_>,
        #[description = "Report type"] kind: ReportKind,
        #[description = "Year, e.g. 2025"] year: i32,
        #[description = "Only reports of this month, 1-12"] month: Option<u32>,
    ) -> Result<()> {
        let report_type = ReportType::from(kind);
        if let Some(month) = month {
            ReportPeriod::month(year, month)?;
        }

        let reports: Vec<tax_report::Model> =
            report::list_reports(&ctx.data().database, report_type, year, month).await?;
        if reports.is_empty() {
            ctx.say("No data for this period.").await?;
            return Ok(());
        }

        let csv = export::reports_to_csv(&reports)?;
        let filename = month.map_or_else(
            || format!("tax-reports-{report_type}-{year:04}.csv"),
            |month| format!("tax-reports-{report_type}-{year:04}-{month:02}.csv"),
        );

        ctx.send(
            poise::CreateReply::default()
                .content(format!("📄 {} {report_type} report(s)", reports.len()))
                .attachment(serenity::CreateAttachment::bytes(csv.into_bytes(), filename)),
        )
        .await?;
        Ok(())
    }

}

// Re-export all commands
pub use inner::*;
