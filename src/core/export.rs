//! CSV export of stored tax reports.
//!
//! One row per report in the order given, every field quoted, amounts with two decimals.

use crate::{
    core::money,
    entities::tax_report,
    errors::{Error, Result},
};
use std::io::Write;

/// Column order of the export
pub const REPORT_CSV_HEADER: [&str; 8] = [
    "Date",
    "Type",
    "Total Orders",
    "Pre-Tax Revenue",
    "Tax Collected",
    "Inc-Tax Revenue",
    "Avg Tax/Order",
    "Avg Order Value",
];

fn format_amount(value: f64) -> String {
    format!("{:.2}", money::round_money(money::to_decimal(value)))
}

/// Writes reports as CSV to `writer`.
///
/// # Errors
/// Returns a CSV error if writing fails.
pub fn write_reports_csv(reports: &[tax_report::Model], writer: impl Write) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(REPORT_CSV_HEADER)?;

    for report in reports {
        csv.write_record(&[
            report.report_date.clone(),
            report.report_type.clone(),
            report.total_orders.to_string(),
            format_amount(report.total_pre_tax_revenue),
            format_amount(report.total_tax_collected),
            format_amount(report.total_inc_tax_revenue),
            format_amount(report.average_tax_per_order),
            format_amount(report.average_order_value),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Renders reports as a CSV document.
///
/// # Errors
/// Returns a CSV error if encoding fails.
pub fn reports_to_csv(reports: &[tax_report::Model]) -> Result<String> {
    let mut buffer = Vec::new();
    write_reports_csv(reports, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| Error::Csv(e.to_string()))
}
