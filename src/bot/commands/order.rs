//! Order Discord commands - `/order_place` and `/order_status`.
//!
//! Staff take phone orders and move orders through their lifecycle. Only completed orders
//! count in tax reports, so completing or cancelling an order changes what the next report
//! generation sees.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, handlers::autocomplete},
        core::{
            customization::SelectedOptions,
            menu, money,
            order::{self, CartLine, NewOrder, OrderStatus},
        },
        entities,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Order status offered as a slash command choice
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum StatusChoice {
        #[name = "pending"]
        Pending,
        #[name = "confirmed"]
        Confirmed,
        #[name = "preparing"]
        Preparing,
        #[name = "ready"]
        Ready,
        #[name = "completed"]
        Completed,
        #[name = "cancelled"]
        Cancelled,
    }

    impl From<StatusChoice> for OrderStatus {
        fn from(choice: StatusChoice) -> Self {
            match choice {
                StatusChoice::Pending => Self::Pending,
                StatusChoice::Confirmed => Self::Confirmed,
                StatusChoice::Preparing => Self::Preparing,
                StatusChoice::Ready => Self::Ready,
                StatusChoice::Completed => Self::Completed,
                StatusChoice::Cancelled => Self::Cancelled,
            }
        }
    }

    /// Formats an order and its lines for display.
    pub fn describe_order(placed: &entities::order::Model) -> Result<String> {
        let mut text = format!(
            "**Order #{} ({})** - {} - {}\n",
            placed.daily_number,
            placed.id,
            placed.customer_name,
            placed.status
        );

        match order::decode_items(placed) {
            Ok(items) => {
                for item in &items {
                    write!(
                        text,
                        "  {} x {} - {}",
                        item.quantity,
                        item.name,
                        money::format_money(item.line_total())
                    )?;
                    if let Some(customizations) = &item.customizations {
                        write!(text, " ({})", customizations.describe())?;
                    }
                    text.push('\n');
                }
            }
            Err(_) => text.push_str("  (line items unavailable)\n"),
        }

        writeln!(
            text,
            "Subtotal: {} | Service fee: {} | Total: {} (incl. {} tax)",
            money::format_money(money::to_decimal(placed.subtotal)),
            money::format_money(money::to_decimal(placed.service_fee)),
            money::format_money(money::to_decimal(placed.total)),
            money::format_money(money::to_decimal(placed.tax))
        )?;
        Ok(text)
    }

    /// Parses `group=option` id pairs separated by commas, e.g. `size=large, extras=bacon`.
    ///
    /// A group may appear more than once to choose several options.
    pub fn parse_selection(input: &str) -> Result<SelectedOptions> {
        let mut selected = SelectedOptions::new();
        for pair in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (group, option) = pair
                .split_once('=')
                .map(|(g, o)| (g.trim(), o.trim()))
                .filter(|(g, o)| !g.is_empty() && !o.is_empty())
                .ok_or_else(|| Error::InvalidSelection {
                    message: format!("expected `group=option`, got '{pair}'"),
                })?;
            selected
                .entry(group.to_string())
                .or_default()
                .insert(option.to_string());
        }
        Ok(selected)
    }

    /// Places an order for one menu item on behalf of a customer.
    #[poise::command(slash_command)]
    pub async fn order_place(
        ctx: Context<'_>,
        #[description = "Customer name"] customer: String,
        #[description = "Menu item"]
        #[autocomplete = "autocomplete::autocomplete_menu_item"]
        item: String,
        #[description = "Quantity (default 1)"]
        #[min = 1]
        quantity: Option<i32>,
        #[description = "Options as group=option pairs, e.g. size=large, extras=bacon"]
        options: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let Some(menu_item) = menu::get_menu_item_by_name(&data.database, item.trim()).await?
        else {
            ctx.say(format!("❌ Could not find a menu item named '{item}'."))
                .await?;
            return Ok(());
        };

        let new_order = NewOrder {
            customer_name: customer,
            lines: vec![CartLine {
                menu_item_id: menu_item.id,
                quantity: quantity.unwrap_or(1),
                options: parse_selection(options.as_deref().unwrap_or_default())?,
            }],
            ..Default::default()
        };
        let placed = order::place_order(
            &data.database,
            &data.rates,
            data.settings.service_fee()?,
            new_order,
        )
        .await?;

        ctx.say(format!("✅ Order placed.\n{}", describe_order(&placed)?))
            .await?;
        Ok(())
    }

    /// Changes the status of an order. Prices and tax are never changed.
    #[poise::command(slash_command)]
    pub async fn order_status(
        ctx: Context<'_>,
        #[description = "Order id"] id: i64,
        #[description = "New status"] status: StatusChoice,
    ) -> Result<()> {
        let updated =
            order::update_order_status(&ctx.data().database, id, OrderStatus::from(status))
                .await?;
        ctx.say(format!("✅ Status updated.\n{}", describe_order(&updated)?))
            .await?;
        Ok(())
    }

}

// Re-export all commands
pub use inner::*;
