//! Sourcing Discord commands - items bought in a foreign currency.
//!
//! A sourced item keeps its supplier price and exchange rate; the local cost is
//! derived from them. Items in auto-price mode also follow cost changes with their
//! sale price, and items linked to a catalog variant can be published as that
//! variant's price.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{
            service::SetPriceOutcome,
            sourcing::{self, NewSourcedItem},
        },
        entities::sourced_item,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Looks an item up by name, replying with an error when it does not exist.
    async fn find_item(
        ctx: poise::Context<'_, BotData, Error>,
        name: &str,
    ) -> Result<Option<sourced_item::Model>> {
        let item = sourcing::get_sourced_item_by_name(&ctx.data().database, name).await?;
        if item.is_none() {
            ctx.say(format!("❌ No sourced item named '{name}'."))
                .await?;
        }
        Ok(item)
    }

    fn describe(item: &sourced_item::Model, currency: &str) -> String {
        format!(
            "**{}**: {:.2} {} → cost {:.0} {currency}, sale **{:.0} {currency}**{}",
            item.name,
            item.foreign_price,
            item.foreign_currency,
            item.cost_price,
            item.sale_price,
            if item.auto_price { " (auto)" } else { "" }
        )
    }

    /// Parent command for currency-sourced items.
    #[poise::command(
        slash_command,
        subcommands(
            "sourcing_add",
            "sourcing_list",
            "sourcing_rate",
            "sourcing_price",
            "sourcing_auto",
            "sourcing_publish"
        )
    )]
    pub async fn sourcing(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Sourcing command. Available subcommands:\n\
            `/sourcing add` - Add an item bought in a foreign currency\n\
            `/sourcing list` - List all sourced items\n\
            `/sourcing rate` - Change an item's exchange rate\n\
            `/sourcing price` - Change an item's supplier price\n\
            `/sourcing auto` - Turn auto-pricing on or off\n\
            `/sourcing publish` - Save an item's price as its catalog variant's price";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds an item bought in a foreign currency.
    #[poise::command(slash_command, rename = "add")]
    pub async fn sourcing_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Unique item name"] name: String,
        #[description = "Supplier price in the foreign currency"] foreign_price: f64,
        #[description = "Supplier currency code (e.g., USD)"] foreign_currency: String,
        #[description = "Exchange rate to the local currency. Defaults to the configured rate."]
        exchange_rate: Option<f64>,
        #[description = "Gross margin in percent. Defaults to the configured margin."]
        margin: Option<f64>,
        #[description = "Recompute the sale price whenever the cost changes"] auto_price: Option<
            bool,
        >,
        #[description = "Catalog product type this item prices"]
        #[autocomplete = "autocomplete::autocomplete_product_type"]
        product_type: Option<String>,
        #[description = "Catalog variant this item prices"]
        #[autocomplete = "autocomplete::autocomplete_variant"]
        variant: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let catalog_pair = match (product_type, variant) {
            (Some(product_type), Some(variant)) => {
                if let Err(e) = data.pricing.catalog().resolve(&product_type, &variant) {
                    ctx.say(format!("❌ {e}")).await?;
                    return Ok(());
                }
                Some((product_type, variant))
            }
            (None, None) => None,
            _ => {
                ctx.say("❌ Give both a product type and a variant to link an item.")
                    .await?;
                return Ok(());
            }
        };

        let new_item = NewSourcedItem {
            name: name.clone(),
            foreign_price,
            foreign_currency,
            exchange_rate,
            margin,
            auto_price: auto_price.unwrap_or(false),
            catalog_pair,
        };

        match sourcing::create_sourced_item(&data.database, data.pricing.settings(), new_item)
            .await
        {
            Ok(item) => {
                ctx.say(format!("✅ Added {}", describe(&item, data.currency())))
                    .await?;
            }
            Err(e @ Error::Database(_)) => {
                let err_msg = format!("{e:?}");
                if err_msg.contains("UNIQUE") || err_msg.contains("unique") {
                    ctx.say(format!(
                        "⚠️ A sourced item named '{name}' already exists. Names must be unique.",
                    ))
                    .await?;
                } else {
                    ctx.say(format!(
                        "❌ Failed to add sourced item '{name}'. Please try again later.",
                    ))
                    .await?;
                    return Err(e);
                }
            }
            Err(e) => {
                ctx.say(format!("❌ {e}")).await?;
            }
        }

        Ok(())
    }

    /// Lists every sourced item with its derived prices.
    #[poise::command(slash_command, rename = "list")]
    pub async fn sourcing_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let items = sourcing::get_all_sourced_items(&data.database).await?;

        if items.is_empty() {
            ctx.say("No sourced items yet. Use `/sourcing add` to create one.")
                .await?;
            return Ok(());
        }

        let description = items
            .iter()
            .map(|item| {
                let rate = item.exchange_rate.map_or_else(
                    || format!("default rate {:.2}", data.pricing.settings().default_exchange_rate),
                    |rate| format!("rate {rate:.2}"),
                );
                let link = match (&item.product_type_id, &item.variant_id) {
                    (Some(pt), Some(v)) => format!(" → {pt} / {v}"),
                    _ => String::new(),
                };
                format!("{} ({rate}){link}", describe(item, data.currency()))
            })
            .collect::<Vec<_>>()
            .join("\n");

        let embed = serenity::CreateEmbed::default()
            .title("Sourced items")
            .description(description)
            .color(0x0034_98DB);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Changes an item's exchange rate and recomputes its cost.
    #[poise::command(slash_command, rename = "rate")]
    pub async fn sourcing_rate(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Sourced item name"]
        #[autocomplete = "autocomplete::autocomplete_sourced_item"]
        name: String,
        #[description = "New exchange rate. Leave empty to use the configured default."]
        exchange_rate: Option<f64>,
    ) -> Result<()> {
        let Some(item) = find_item(ctx, &name).await? else {
            return Ok(());
        };
        let data = ctx.data();
        match sourcing::update_exchange_rate(
            &data.database,
            data.pricing.settings(),
            item.id,
            exchange_rate,
        )
        .await
        {
            Ok(item) => {
                ctx.say(format!("✅ Updated {}", describe(&item, data.currency())))
                    .await?;
            }
            Err(e @ Error::Database(_)) => return Err(e),
            Err(e) => {
                ctx.say(format!("❌ {e}")).await?;
            }
        }
        Ok(())
    }

    /// Changes an item's supplier price and recomputes its cost.
    #[poise::command(slash_command, rename = "price")]
    pub async fn sourcing_price(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Sourced item name"]
        #[autocomplete = "autocomplete::autocomplete_sourced_item"]
        name: String,
        #[description = "New supplier price in the foreign currency"] foreign_price: f64,
    ) -> Result<()> {
        let Some(item) = find_item(ctx, &name).await? else {
            return Ok(());
        };
        let data = ctx.data();
        match sourcing::update_foreign_price(
            &data.database,
            data.pricing.settings(),
            item.id,
            foreign_price,
        )
        .await
        {
            Ok(item) => {
                ctx.say(format!("✅ Updated {}", describe(&item, data.currency())))
                    .await?;
            }
            Err(e @ Error::Database(_)) => return Err(e),
            Err(e) => {
                ctx.say(format!("❌ {e}")).await?;
            }
        }
        Ok(())
    }

    /// Turns auto-pricing on or off, optionally changing the item's margin.
    #[poise::command(slash_command, rename = "auto")]
    pub async fn sourcing_auto(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Sourced item name"]
        #[autocomplete = "autocomplete::autocomplete_sourced_item"]
        name: String,
        #[description = "Whether the sale price follows the cost"] enabled: bool,
        #[description = "Gross margin in percent for this item"] margin: Option<f64>,
    ) -> Result<()> {
        let Some(item) = find_item(ctx, &name).await? else {
            return Ok(());
        };
        let data = ctx.data();
        match sourcing::set_auto_price(
            &data.database,
            data.pricing.settings(),
            item.id,
            enabled,
            margin,
        )
        .await
        {
            Ok(item) => {
                ctx.say(format!(
                    "✅ Auto-pricing {} at {:.1}%: {}",
                    if enabled { "on" } else { "off" },
                    sourcing::effective_margin(&item, data.pricing.settings()),
                    describe(&item, data.currency())
                ))
                .await?;
            }
            Err(e @ Error::Database(_)) => return Err(e),
            Err(e) => {
                ctx.say(format!("❌ {e}")).await?;
            }
        }
        Ok(())
    }

    /// Saves an item's cost and sale price as the price of its linked catalog variant.
    #[poise::command(slash_command, rename = "publish")]
    pub async fn sourcing_publish(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Sourced item name"]
        #[autocomplete = "autocomplete::autocomplete_sourced_item"]
        name: String,
        #[description = "Confirm a margin below the confirmation threshold"] confirm: Option<
            bool,
        >,
    ) -> Result<()> {
        let Some(item) = find_item(ctx, &name).await? else {
            return Ok(());
        };
        let data = ctx.data();
        let updated_by = ctx.author().id.to_string();
        let outcome = sourcing::publish_to_overrides(
            &data.pricing,
            &item,
            &updated_by,
            confirm.unwrap_or(false),
        )
        .await?;

        let currency = data.currency();
        match outcome {
            None => {
                ctx.say(format!(
                    "❌ '{}' is not linked to a catalog variant.",
                    item.name
                ))
                .await?;
            }
            Some(SetPriceOutcome::NeedsConfirmation { margin, unit_price }) => {
                ctx.say(format!(
                    "⚠️ Publishing at **{unit_price:.0} {currency}** gives a margin of only **{margin:.1}%**. \
                    Nothing was saved. Run the command again with `confirm: True` to publish anyway.",
                ))
                .await?;
            }
            Some(SetPriceOutcome::Saved { record, .. }) => {
                ctx.say(format!(
                    "✅ Published '{}' as the price of **{} / {}**: {:.0} {currency} at {:.1}%.",
                    item.name,
                    record.product_type_id,
                    record.variant_id,
                    record.unit_price,
                    record.margin
                ))
                .await?;
            }
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
