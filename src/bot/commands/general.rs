//! General Discord commands - ping and help.
//! These commands don't touch the database and provide basic bot functionality
//! and staff assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{bot::Context, errors::Result};

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let help_text = "**Bistro Ledger Help**\n\
        Prices are tax-inclusive. Tax reports count completed orders only and use UTC days.\n\n\
        **Reports**\n\
        • `/tax_report daily <date>` - Report of one day (YYYY-MM-DD).\n\
        • `/tax_report monthly <year> <month>` - Report of one month.\n\
        • `/tax_report yearly <year>` - Report of one year.\n\
        • `/tax_report range <start> <end>` - Totals over any span of days.\n\
        • `/tax_report generate <kind> [date] [year] [month]` - Regenerate and store a report.\n\
        • `/tax_report export <kind> <year> [month]` - Download stored reports as CSV.\n\n\
        **Menu**\n\
        • `/menu_price show <item>` - Price, base price and tax rate of an item.\n\
        • `/menu_price set_price <item> <price>` - Set the price including tax.\n\
        • `/menu_price set_base_price <item> <price>` - Set the price before tax.\n\n\
        **Orders**\n\
        • `/order_place <customer> <item> [quantity] [options]` - Place an order.\n\
          Options are `group=option` pairs, e.g. `size=large, extras=bacon`.\n\
        • `/order_status <id> <status>` - Move an order through its lifecycle.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
