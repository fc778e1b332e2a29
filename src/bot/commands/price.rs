//! Price Discord commands - `/price set`, `get`, `history` and `bulk`.
//!
//! These commands are a thin layer over [`crate::core::service::PricingService`]:
//! they translate slash command options into service requests and render the
//! outcome, including low-margin warnings and the confirmation prompt.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{
            catalog::ScopeFilter,
            overrides::{BulkReport, SkipReason},
            pricing::MarginAssessment,
            service::{BulkOutcome, PriceInput, SetPriceOutcome, SetPriceRequest},
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write as _;

    /// Number of records shown by `/price history`.
    const HISTORY_LIMIT: usize = 10;

    /// Errors caused by what the user typed, as opposed to storage failures.
    const fn is_user_error(error: &Error) -> bool {
        matches!(
            error,
            Error::InvalidMargin { .. }
                | Error::InvalidCost { .. }
                | Error::InvalidPrice { .. }
                | Error::ProductTypeNotFound { .. }
                | Error::VariantNotFound { .. }
        )
    }

    /// Parent command for price overrides.
    #[poise::command(
        slash_command,
        subcommands("price_set", "price_get", "price_history", "price_bulk")
    )]
    pub async fn price(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Price command. Available subcommands:\n\
            `/price set` - Save a new price for a variant\n\
            `/price get` - Show the current price of a variant\n\
            `/price history` - Show every price saved for a variant\n\
            `/price bulk` - Re-derive sale prices at one margin";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Saves a price for one variant.
    ///
    /// Give either a sale price or a margin, not both. With neither, the sale price is
    /// derived from the cost at the default margin.
    #[poise::command(slash_command, rename = "set")]
    pub async fn price_set(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product type id"]
        #[autocomplete = "autocomplete::autocomplete_product_type"]
        product_type: String,
        #[description = "Variant id"]
        #[autocomplete = "autocomplete::autocomplete_variant"]
        variant: String,
        #[description = "Cost price"] cost: f64,
        #[description = "Sale price (the margin is computed from it)"] sale_price: Option<f64>,
        #[description = "Gross margin in percent (the sale price is computed from it)"]
        margin: Option<f64>,
        #[description = "Confirm a margin below the confirmation threshold"] confirm: Option<
            bool,
        >,
    ) -> Result<()> {
        let price = match (sale_price, margin) {
            (Some(_), Some(_)) => {
                ctx.say("❌ Give either a sale price or a margin, not both.")
                    .await?;
                return Ok(());
            }
            (Some(sale_price), None) => PriceInput::SalePrice(sale_price),
            (None, Some(margin)) => PriceInput::Margin(margin),
            (None, None) => PriceInput::DefaultMargin,
        };

        let data = ctx.data();
        let request = SetPriceRequest {
            product_type_id: product_type.clone(),
            variant_id: variant.clone(),
            cost_price: cost,
            price,
            updated_by: ctx.author().id.to_string(),
            confirmed: confirm.unwrap_or(false),
        };

        let outcome = match data.pricing.set_price(request).await {
            Ok(outcome) => outcome,
            Err(e) if is_user_error(&e) => {
                ctx.say(format!("❌ {e}")).await?;
                return Ok(());
            }
            Err(e @ Error::ConcurrentUpdate { .. }) => {
                ctx.say("⚠️ Someone else changed this price at the same time. Please try again.")
                    .await?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let currency = data.currency();
        match outcome {
            SetPriceOutcome::NeedsConfirmation { margin, unit_price } => {
                ctx.say(format!(
                    "⚠️ A sale price of **{unit_price:.0} {currency}** gives a margin of only **{margin:.1}%**. \
                    Nothing was saved. Run the command again with `confirm: True` to save it anyway.",
                ))
                .await?;
            }
            SetPriceOutcome::Saved {
                record,
                previous,
                assessment,
            } => {
                let mut message = format!(
                    "✅ Price for **{product_type} / {variant}** saved: sale **{:.0} {currency}**, cost {:.0}, margin {:.1}%.",
                    record.unit_price, record.cost_price, record.margin
                );
                if let Some(previous) = previous {
                    write!(
                        &mut message,
                        "\nPrevious price was {:.0} {currency} at {:.1}%.",
                        previous.unit_price, previous.margin
                    )?;
                }
                if assessment != MarginAssessment::Healthy {
                    write!(
                        &mut message,
                        "\n⚠️ Margin is below {:.0}%.",
                        data.pricing.settings().warning_margin
                    )?;
                }
                ctx.say(message).await?;
            }
        }

        Ok(())
    }

    /// Shows the current price of one variant.
    #[poise::command(slash_command, rename = "get")]
    pub async fn price_get(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product type id"]
        #[autocomplete = "autocomplete::autocomplete_product_type"]
        product_type: String,
        #[description = "Variant id"]
        #[autocomplete = "autocomplete::autocomplete_variant"]
        variant: String,
    ) -> Result<()> {
        let data = ctx.data();
        let (product_type_info, variant_info) =
            match data.pricing.catalog().resolve(&product_type, &variant) {
                Ok(pair) => pair,
                Err(e) => {
                    ctx.say(format!("❌ {e}")).await?;
                    return Ok(());
                }
            };

        let Some(record) = data
            .pricing
            .get_active_price(&product_type, &variant)
            .await?
        else {
            ctx.say(format!(
                "Price not configured for **{} / {}**.",
                product_type_info.name, variant_info.name
            ))
            .await?;
            return Ok(());
        };

        let assessment = data.pricing.assess(record.margin);
        let margin_note = match assessment {
            MarginAssessment::Healthy => "",
            MarginAssessment::Warning => " ⚠️",
            MarginAssessment::RequiresConfirmation => " ❗",
        };

        let embed = serenity::CreateEmbed::default()
            .title(format!("{} / {}", product_type_info.name, variant_info.name))
            .field(
                "Sale price",
                format!("{:.0} {}", record.unit_price, record.currency),
                true,
            )
            .field("Cost", format!("{:.0}", record.cost_price), true)
            .field("Margin", format!("{:.1}%{margin_note}", record.margin), true)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Updated {} by {}",
                record.last_updated.format("%Y-%m-%d %H:%M"),
                record.updated_by
            )))
            .color(0x0034_98DB);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows the prices saved for one variant, newest first.
    #[poise::command(slash_command, rename = "history")]
    pub async fn price_history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Product type id"]
        #[autocomplete = "autocomplete::autocomplete_product_type"]
        product_type: String,
        #[description = "Variant id"]
        #[autocomplete = "autocomplete::autocomplete_variant"]
        variant: String,
    ) -> Result<()> {
        let history = ctx
            .data()
            .pricing
            .price_history(&product_type, &variant)
            .await?;

        if history.is_empty() {
            ctx.say(format!(
                "No prices have been saved for **{product_type} / {variant}**."
            ))
            .await?;
            return Ok(());
        }

        let mut description = String::new();
        for record in history.iter().take(HISTORY_LIMIT) {
            let marker = if record.is_active { "▶" } else { "•" };
            writeln!(
                &mut description,
                "{marker} {} - **{:.0} {}** (cost {:.0}, {:.1}%) by {}",
                record.valid_from.format("%Y-%m-%d %H:%M"),
                record.unit_price,
                record.currency,
                record.cost_price,
                record.margin,
                record.updated_by
            )?;
        }

        let embed = serenity::CreateEmbed::default()
            .title(format!("Price history: {product_type} / {variant}"))
            .description(description)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Showing {} of {} record{}",
                history.len().min(HISTORY_LIMIT),
                history.len(),
                if history.len() == 1 { "" } else { "s" }
            )))
            .color(0x0034_98DB);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Lists skipped variants of one kind under a heading.
    fn write_skipped(
        message: &mut String,
        report: &BulkReport,
        reason: SkipReason,
        heading: &str,
    ) -> std::fmt::Result {
        let skipped: Vec<_> = report.skipped.iter().filter(|s| s.reason == reason).collect();
        if skipped.is_empty() {
            return Ok(());
        }
        write!(message, "\nSkipped {} {heading}:", skipped.len())?;
        for s in skipped {
            write!(message, "\n• {} / {}", s.product_type_id, s.variant_id)?;
        }
        Ok(())
    }

    /// Renders the reply for a finished bulk rewrite.
    fn bulk_summary(report: &BulkReport, low_margin_warning: Option<f64>) -> Result<String> {
        let mut message = format!(
            "✅ Applied a {:.1}% margin to **{}** variant{}.",
            report.target_margin,
            report.applied.len(),
            if report.applied.len() == 1 { "" } else { "s" }
        );
        let not_priced = report
            .skipped
            .iter()
            .filter(|s| s.reason == SkipReason::NotPriced)
            .count();
        if not_priced > 0 {
            write!(&mut message, "\nSkipped {not_priced} without a price.")?;
        }
        write_skipped(&mut message, report, SkipReason::MissingCost, "without a cost price")?;
        write_skipped(
            &mut message,
            report,
            SkipReason::InvalidCost,
            "with an invalid stored cost",
        )?;
        if let Some(warning_margin) = low_margin_warning {
            write!(
                &mut message,
                "\n⚠️ {:.1}% is below the {warning_margin:.0}% warning threshold.",
                report.target_margin,
            )?;
        }
        Ok(message)
    }

    /// Re-derives the sale price of every priced variant from its cost at one margin.
    ///
    /// Limit the rewrite with either a product type or a service category. A margin
    /// below the confirmation threshold is only applied with `confirm: True`.
    #[poise::command(slash_command, rename = "bulk")]
    pub async fn price_bulk(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Gross margin in percent to apply"] margin: f64,
        #[description = "Only this product type"]
        #[autocomplete = "autocomplete::autocomplete_product_type"]
        product_type: Option<String>,
        #[description = "Only this service category"]
        #[autocomplete = "autocomplete::autocomplete_service_category"]
        service_category: Option<String>,
        #[description = "Confirm a margin below the confirmation threshold"] confirm: Option<
            bool,
        >,
    ) -> Result<()> {
        let scope = match (product_type, service_category) {
            (Some(_), Some(_)) => {
                ctx.say("❌ Give either a product type or a service category, not both.")
                    .await?;
                return Ok(());
            }
            (Some(product_type), None) => ScopeFilter::ProductType(product_type),
            (None, Some(category)) => ScopeFilter::ServiceCategory(category),
            (None, None) => ScopeFilter::All,
        };

        ctx.defer().await?;

        let data = ctx.data();
        let updated_by = ctx.author().id.to_string();
        let outcome = match data
            .pricing
            .bulk_set_margin(margin, &scope, &updated_by, confirm.unwrap_or(false))
            .await
        {
            Ok(outcome) => outcome,
            Err(e) if is_user_error(&e) => {
                ctx.say(format!("❌ {e}")).await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let report = match outcome {
            BulkOutcome::NeedsConfirmation { target_margin } => {
                ctx.say(format!(
                    "⚠️ A {target_margin:.1}% margin is below the {:.0}% confirmation threshold. \
                    Nothing was changed. Run the command again with `confirm: True` to apply it anyway.",
                    data.pricing.settings().confirmation_margin
                ))
                .await?;
                return Ok(());
            }
            BulkOutcome::Applied(report) => report,
        };

        let low_margin_warning = (data.pricing.assess(report.target_margin)
            != MarginAssessment::Healthy)
            .then_some(data.pricing.settings().warning_margin);
        ctx.say(bulk_summary(&report, low_margin_warning)?).await?;
        Ok(())
    }

}

// Re-export all commands
pub use inner::*;
