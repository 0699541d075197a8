//! Effective tax rate resolution.
//!
//! An item's rate comes from the first level that sets one: the item itself, then its
//! category, then the configured default. The default is carried by [`TaxRates`] and passed
//! in explicitly so callers (and tests) can vary it.

use crate::{
    core::money,
    entities::{menu_category, menu_item},
    errors::Result,
};
use rust_decimal::Decimal;

/// Process-wide tax configuration handed to every resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxRates {
    default_rate: Decimal,
}

impl TaxRates {
    /// Creates the configuration, validating that `0 <= default_rate < 1`.
    ///
    /// # Errors
    /// Returns `InvalidRate` for an out-of-range default.
    pub fn new(default_rate: Decimal) -> Result<Self> {
        money::validate_rate(default_rate)?;
        Ok(Self { default_rate })
    }

    /// The rate used when neither item nor category set one.
    #[must_use]
    pub const fn default_rate(&self) -> Decimal {
        self.default_rate
    }

    /// Applies the override chain to already-decoded rates.
    #[must_use]
    pub fn resolve(&self, item_rate: Option<Decimal>, category_rate: Option<Decimal>) -> Decimal {
        item_rate.or(category_rate).unwrap_or(self.default_rate)
    }
}

impl Default for TaxRates {
    /// 13.5%
    fn default() -> Self {
        Self {
            default_rate: Decimal::new(135, 3),
        }
    }
}

/// Returns the effective tax rate for a menu item.
///
/// The category is optional: callers that could not load it (or have no category at hand)
/// get the item's own rate or the default.
#[must_use]
pub fn resolve_tax_rate(
    rates: &TaxRates,
    item: &menu_item::Model,
    category: Option<&menu_category::Model>,
) -> Decimal {
    rates.resolve(
        item.tax_rate.map(money::stored_rate),
        category.and_then(|c| c.tax_rate).map(money::stored_rate),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::NaiveDate;

    fn category(tax_rate: Option<f64>) -> menu_category::Model {
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        menu_category::Model {
            id: 1,
            name: "Mains".to_string(),
            tax_rate,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(tax_rate: Option<f64>) -> menu_item::Model {
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        menu_item::Model {
            id: 1,
            name: "Burger".to_string(),
            category_id: 1,
            price: 11.49,
            base_price: None,
            tax_rate,
            option_groups: None,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_item_rate_wins_over_category() {
        let rate = resolve_tax_rate(
            &TaxRates::default(),
            &item(Some(0.09)),
            Some(&category(Some(0.20))),
        );
        assert_eq!(rate, Decimal::new(9, 2));
    }

    #[test]
    fn test_category_rate_used_without_item_rate() {
        let rate = resolve_tax_rate(&TaxRates::default(), &item(None), Some(&category(Some(0.20))));
        assert_eq!(rate, Decimal::new(2, 1));
    }

    #[test]
    fn test_default_rate_used_when_nothing_set() {
        let rate = resolve_tax_rate(&TaxRates::default(), &item(None), Some(&category(None)));
        assert_eq!(rate, Decimal::new(135, 3));

        let rate = resolve_tax_rate(&TaxRates::default(), &item(None), None);
        assert_eq!(rate, Decimal::new(135, 3));
    }

    #[test]
    fn test_configured_default_rate() {
        let rates = TaxRates::new(Decimal::new(21, 2)).unwrap();
        assert_eq!(resolve_tax_rate(&rates, &item(None), None), Decimal::new(21, 2));
    }

    #[test]
    fn test_zero_item_rate_is_an_override() {
        let rate = resolve_tax_rate(
            &TaxRates::default(),
            &item(Some(0.0)),
            Some(&category(Some(0.2))),
        );
        assert_eq!(rate, Decimal::ZERO);
    }

    #[test]
    fn test_rejects_invalid_default() {
        assert!(TaxRates::new(Decimal::ONE).is_err());
        assert!(TaxRates::new(Decimal::new(-1, 2)).is_err());
    }
}
