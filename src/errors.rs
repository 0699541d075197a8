//! Unified error type for the ledger.
//!
//! Domain failures use struct variants so callers can match on the offending value;
//! infrastructure failures (database, serialization, Discord) are wrapped.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("Invalid tax rate: {rate} (must be at least 0 and below 1)")]
    InvalidRate { rate: Decimal },

    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: i32 },

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: String, end: String },

    #[error("Date range of {days} days exceeds the maximum of {max_days}")]
    RangeTooLarge { days: i64, max_days: i64 },

    #[error("Menu item not found: {id}")]
    MenuItemNotFound { id: i64 },

    #[error("Menu category not found: {id}")]
    CategoryNotFound { id: i64 },

    #[error("Order not found: {id}")]
    OrderNotFound { id: i64 },

    #[error("Unknown order status: {status}")]
    InvalidStatus { status: String },

    #[error("Invalid selection: {message}")]
    InvalidSelection { message: String },

    #[error("No {report_type} report for {report_date}")]
    ReportNotFound {
        report_type: String,
        report_date: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Database(value.to_string())
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value.to_string())
    }
}

impl Error {
    /// Whether the error was caused by caller input rather than infrastructure.
    ///
    /// The command surface shows these messages verbatim; everything else is
    /// reported as a generic retryable failure.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::InvalidRate { .. }
                | Self::InvalidQuantity { .. }
                | Self::InvalidRange { .. }
                | Self::RangeTooLarge { .. }
                | Self::MenuItemNotFound { .. }
                | Self::CategoryNotFound { .. }
                | Self::OrderNotFound { .. }
                | Self::InvalidStatus { .. }
                | Self::InvalidSelection { .. }
                | Self::ReportNotFound { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_flagged() {
        let err = Error::InvalidRange {
            start: "2025-01-10".to_string(),
            end: "2025-01-01".to_string(),
        };
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Invalid date range: 2025-01-10 is after 2025-01-01"
        );
    }

    #[test]
    fn test_database_errors_are_not_client_errors() {
        let err: Error = sea_orm::DbErr::Custom("locked".to_string()).into();
        assert!(!err.is_client_error());
        assert!(matches!(err, Error::Database(_)));
    }
}
