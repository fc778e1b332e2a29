//! General Discord commands - ping, help, and other utility commands.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    ///
    /// This is a simple health check command that doesn't require any database operations.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let settings = ctx.data().pricing.settings();
        let help_text = format!(
            "**PriceDesk Help**\n\
            Prices are stored per product type and variant. Margin is gross margin \
            (share of the sale price), not markup.\n\n\
            **Price Commands**\n\
            • `/price set <type> <variant> <cost> [sale_price | margin] [confirm]` - Saves a price. \
            Without a sale price or margin the default margin ({default:.0}%) applies.\n\
            • `/price get <type> <variant>` - Shows the current price.\n\
            • `/price history <type> <variant>` - Shows every price saved for a variant.\n\
            • `/price bulk <margin> [type | category] [confirm]` - Re-derives sale prices from cost for every priced variant.\n\n\
            **Sourcing Commands**\n\
            • `/sourcing add|list|rate|price|auto|publish` - Manage items bought in a foreign currency.\n\n\
            **Utility Commands**\n\
            • `/ping` - Checks if the bot is responsive.\n\
            • `/help` - Shows this help message.\n\n\
            Margins below {warn:.0}% show a warning; below {confirm:.0}% they need `confirm: True`.",
            default = settings.default_margin,
            warn = settings.warning_margin,
            confirm = settings.confirmation_margin,
        );

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
