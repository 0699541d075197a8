//! Application settings loading from config.toml
//!
//! Every section is optional; missing values fall back to the defaults documented on each
//! field. Categories and menu items listed here seed an empty database on first run.

use crate::{
    core::{money, tax_rate::TaxRates},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    /// Tax settings
    pub tax: TaxSettings,
    /// Checkout settings
    pub orders: OrderSettings,
    /// Report generation settings
    pub reports: ReportSettings,
    /// Categories to seed
    pub categories: Vec<CategoryConfig>,
    /// Menu items to seed
    pub menu_items: Vec<MenuItemConfig>,
}

/// `[tax]` section
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TaxSettings {
    /// Rate applied when neither item nor category override it. Default 0.135.
    pub default_rate: f64,
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            default_rate: 0.135,
        }
    }
}

/// `[orders]` section
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OrderSettings {
    /// Flat fee added to every order total. Default 0.
    pub service_fee: f64,
}

/// `[reports]` section
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportSettings {
    /// Regenerate a report before showing it. Default true.
    pub regenerate_on_read: bool,
    /// Longest range a caller may aggregate in one request. Default 366.
    pub max_range_days: i64,
    /// Orders fetched per query while aggregating. Default 500.
    pub page_size: u64,
    /// Seconds between rollover checks. Default 3600.
    pub rollover_interval_secs: u64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            regenerate_on_read: true,
            max_range_days: 366,
            page_size: 500,
            rollover_interval_secs: 3600,
        }
    }
}

/// A category to seed
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    /// Category name
    pub name: String,
    /// Optional tax rate override
    pub tax_rate: Option<f64>,
}

/// A menu item to seed
#[derive(Debug, Deserialize, Clone)]
pub struct MenuItemConfig {
    /// Item name
    pub name: String,
    /// Name of a category from `[[categories]]`
    pub category: String,
    /// Tax-inclusive price
    pub price: f64,
    /// Optional tax rate override
    pub tax_rate: Option<f64>,
}

impl Settings {
    /// The tax rates to hand to the resolver.
    ///
    /// # Errors
    /// Returns an error if the configured default rate is outside `0 <= rate < 1`.
    pub fn tax_rates(&self) -> Result<TaxRates> {
        TaxRates::new(money::rate_from_f64(self.tax.default_rate)?)
    }

    /// The configured service fee as a decimal amount.
    ///
    /// # Errors
    /// Returns an error if the fee is negative or not finite.
    pub fn service_fee(&self) -> Result<Decimal> {
        money::amount_from_f64(self.orders.service_fee)
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The tax rate or service fee is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses and validates settings from TOML text.
///
/// # Errors
/// Returns an error if the TOML is invalid or a value is out of range.
pub fn parse_config(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    settings.tax_rates()?;
    settings.service_fee()?;
    if settings.reports.max_range_days < 1 || settings.reports.page_size == 0 {
        return Err(Error::Config {
            message: "reports.max_range_days and reports.page_size must be positive".to_string(),
        });
    }

    Ok(settings)
}

/// Loads settings from `CONFIG_PATH` (default `./config.toml`).
///
/// A missing file is not an error; the defaults are used instead.
pub fn load_default_config() -> Result<Settings> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_config(&path)
    } else {
        info!("No configuration file at {path}, using defaults");
        Ok(Settings::default())
    }
}
