//! Core business logic - framework-agnostic pricing, ordering and tax reporting.
//!
//! Everything here takes a sea-orm connection (or transaction) and plain values; the bot
//! layer only parses input and formats output.

/// Order aggregation over date ranges
pub mod aggregation;
/// Option groups and customer selections
pub mod customization;
/// CSV export of stored reports
pub mod export;
/// Categories, menu items and price edits
pub mod menu;
/// Decimal money arithmetic and price conversions
pub mod money;
/// Order line items, checkout and status
pub mod order;
/// Report periods and UTC date ranges
pub mod period;
/// Tax report generation and storage
pub mod report;
/// Scheduled generation of finished periods
pub mod rollover;
/// Effective tax rate resolution
pub mod tax_rate;
