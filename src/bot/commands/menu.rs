//! Menu price Discord commands - `/menu_price show|set_price|set_base_price`.
//!
//! Each edit changes one side of the price pair and derives the other from the item's
//! effective tax rate. The rate itself is never changed here.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, handlers::autocomplete},
        core::{
            customization,
            menu::{self, PriceEdit},
            money,
        },
        entities::menu_item,
        errors::Result,
    };
    use std::fmt::Write;

    async fn find_item(ctx: Context<'_>, name: &str) -> Result<Option<menu_item::Model>> {
        menu::get_menu_item_by_name(&ctx.data().database, name.trim()).await
    }

    async fn describe_item(ctx: Context<'_>, item: &menu_item::Model) -> Result<String> {
        let data = ctx.data();
        let rate = menu::effective_rate(&data.database, &data.rates, item).await?;
        let price = money::to_decimal(item.price);
        let base_price = item
            .base_price
            .map_or_else(|| money::to_base_price(price, rate), money::to_decimal);

        let mut text = format!(
            "**{}**\nPrice: {} (inc. {} tax)\nBase price: {}",
            item.name,
            money::format_money(price),
            money::rate_label(rate),
            money::format_money(base_price)
        );
        if item.tax_rate.is_some() {
            text.push_str("\nRate set on the item");
        }

        let groups = customization::decode_option_groups(item)?;
        for group in &groups {
            let options = group
                .options
                .iter()
                .map(|o| {
                    if o.price_modifier.is_zero() {
                        o.name.clone()
                    } else {
                        format!("{} (+{})", o.name, money::format_money(o.price_modifier))
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            write!(text, "\n{}: {options}", group.name)?;
        }
        Ok(text)
    }

    async fn edit_price(ctx: Context<'_>, name: &str, edit: PriceEdit) -> Result<()> {
        let Some(item) = find_item(ctx, name).await? else {
            ctx.say(format!("❌ Could not find a menu item named '{name}'."))
                .await?;
            return Ok(());
        };

        let data = ctx.data();
        let updated = menu::apply_price_edit(&data.database, &data.rates, item.id, edit).await?;
        ctx.say(format!("✅ Updated.\n{}", describe_item(ctx, &updated).await?))
            .await?;
        Ok(())
    }

    /// Parent command for menu prices.
    #[poise::command(
        slash_command,
        subcommands("menu_price_show", "menu_price_set_price", "menu_price_set_base_price")
    )]
    pub async fn menu_price(ctx: Context<'_>) -> Result<()> {
        let help_text = "Menu price command. Available subcommands:\n\
            `/menu_price show` - Show an item's prices and tax rate\n\
            `/menu_price set_price` - Set the price customers pay (tax included)\n\
            `/menu_price set_base_price` - Set the price before tax";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows an item's price, base price and effective tax rate.
    #[poise::command(slash_command, rename = "show")]
    pub async fn menu_price_show(
        ctx: Context<'_>,
        #[description = "Menu item"]
        #[autocomplete = "autocomplete::autocomplete_menu_item"]
        item: String,
    ) -> Result<()> {
        let Some(found) = find_item(ctx, &item).await? else {
            ctx.say(format!("❌ Could not find a menu item named '{item}'."))
                .await?;
            return Ok(());
        };
        ctx.say(describe_item(ctx, &found).await?).await?;
        Ok(())
    }

    /// Sets the tax-inclusive price; the base price is recalculated.
    #[poise::command(slash_command, rename = "set_price")]
    pub async fn menu_price_set_price(
        ctx: Context<'_>,
        #[description = "Menu item"]
        #[autocomplete = "autocomplete::autocomplete_menu_item"]
        item: String,
        #[description = "New price including tax (e.g., 11.49)"] price: f64,
    ) -> Result<()> {
        edit_price(ctx, &item, PriceEdit::DisplayPrice(money::amount_from_f64(price)?)).await
    }

    /// Sets the pre-tax price; the customer price is recalculated.
    #[poise::command(slash_command, rename = "set_base_price")]
    pub async fn menu_price_set_base_price(
        ctx: Context<'_>,
        #[description = "Menu item"]
        #[autocomplete = "autocomplete::autocomplete_menu_item"]
        item: String,
        #[description = "New price before tax (e.g., 10.12)"] base_price: f64,
    ) -> Result<()> {
        edit_price(ctx, &item, PriceEdit::BasePrice(money::amount_from_f64(base_price)?)).await
    }
}

// Re-export all commands
pub use inner::*;
