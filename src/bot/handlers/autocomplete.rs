//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggests menu item names as staff type, so price commands receive exact names.

use crate::{bot::Context, core::menu};

/// Discord accepts at most 25 suggestions
const MAX_SUGGESTIONS: usize = 25;

/// Provides autocomplete suggestions for available menu item names.
///
/// Matches are case-insensitive substrings of the item name, sorted alphabetically.
pub async fn autocomplete_menu_item(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Ok(items) = menu::get_available_menu_items(&ctx.data().database).await else {
        return Vec::new();
    };
    matching_names(items.into_iter().map(|item| item.name), partial)
}

fn matching_names(names: impl Iterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = names
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .collect();

    matching.sort();
    matching
}
