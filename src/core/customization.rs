//! Item customizations - option groups offered by a menu item and the customer's choices.
//!
//! A menu item stores its option groups as JSON. At checkout the customer's selection is
//! validated against those groups and turned into a [`Customization`] snapshot, which is
//! stored on the order line together with the price modifiers in effect at that time.

use crate::{
    entities::menu_item,
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A group of choices such as "Size" or "Extras".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    /// Stable identifier referenced by selections
    pub id: String,
    /// Display name
    pub name: String,
    /// At least one option must be chosen
    #[serde(default)]
    pub required: bool,
    /// Upper bound on chosen options; unlimited when absent
    #[serde(default)]
    pub max_selections: Option<usize>,
    /// Options in display order
    pub options: Vec<MenuOption>,
}

/// One choice inside an [`OptionGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    /// Identifier, unique within its group
    pub id: String,
    /// Display name
    pub name: String,
    /// Tax-inclusive amount added to the unit price (may be negative)
    #[serde(default)]
    pub price_modifier: Decimal,
    /// Sold-out options cannot be chosen
    #[serde(default = "available_by_default")]
    pub available: bool,
}

const fn available_by_default() -> bool {
    true
}

/// Chosen option ids keyed by group id.
pub type SelectedOptions = BTreeMap<String, BTreeSet<String>>;

/// Snapshot of one chosen option as stored on an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenOption {
    /// Group display name at order time
    pub group: String,
    /// Option display name at order time
    pub option: String,
    /// Price modifier at order time
    pub price_modifier: Decimal,
}

/// Validated customizations of one order line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customization {
    /// Chosen options in group order
    pub choices: Vec<ChosenOption>,
}

impl Customization {
    /// Sum of all price modifiers
    #[must_use]
    pub fn price_modifier_total(&self) -> Decimal {
        self.choices.iter().map(|c| c.price_modifier).sum()
    }

    /// Human readable summary, e.g. `"Size: Large, Extras: Bacon"`
    #[must_use]
    pub fn describe(&self) -> String {
        self.choices
            .iter()
            .map(|c| format!("{}: {}", c.group, c.option))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Decodes the option groups stored on a menu item.
///
/// # Errors
/// Returns a serialization error if the stored JSON is malformed.
pub fn decode_option_groups(item: &menu_item::Model) -> Result<Vec<OptionGroup>> {
    match item.option_groups.as_deref() {
        Some(json) if !json.trim().is_empty() => Ok(serde_json::from_str(json)?),
        _ => Ok(Vec::new()),
    }
}

/// Encodes option groups for storage; an empty list is stored as `NULL`.
///
/// # Errors
/// Returns a serialization error if encoding fails.
pub fn encode_option_groups(groups: &[OptionGroup]) -> Result<Option<String>> {
    if groups.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(groups)?))
}

fn invalid(message: String) -> Error {
    Error::InvalidSelection { message }
}

/// Checks a selection against the offered groups and builds the line snapshot.
///
/// # Errors
/// Returns `InvalidSelection` when a group or option does not exist, an option is
/// unavailable, a group has too many choices, or a required group has none.
pub fn validate_selection(
    groups: &[OptionGroup],
    selected: &SelectedOptions,
) -> Result<Customization> {
    if let Some(unknown) = selected
        .keys()
        .find(|group_id| !groups.iter().any(|g| &g.id == *group_id))
    {
        return Err(invalid(format!("unknown option group '{unknown}'")));
    }

    let mut choices = Vec::new();
    for group in groups {
        let chosen = selected.get(&group.id).filter(|ids| !ids.is_empty());

        let Some(chosen) = chosen else {
            if group.required {
                return Err(invalid(format!("'{}' requires a choice", group.name)));
            }
            continue;
        };

        if let Some(max) = group.max_selections {
            if chosen.len() > max {
                return Err(invalid(format!(
                    "'{}' allows at most {max} choice(s), got {}",
                    group.name,
                    chosen.len()
                )));
            }
        }

        for option_id in chosen {
            let option = group
                .options
                .iter()
                .find(|o| &o.id == option_id)
                .ok_or_else(|| {
                    invalid(format!("'{}' has no option '{option_id}'", group.name))
                })?;
            if !option.available {
                return Err(invalid(format!("'{}' is not available", option.name)));
            }
            choices.push(ChosenOption {
                group: group.name.clone(),
                option: option.name.clone(),
                price_modifier: option.price_modifier,
            });
        }
    }

    Ok(Customization { choices })
}
