//! Autocomplete handlers for Discord slash command parameters.
//!
//! Catalog suggestions come from the in-memory catalog loaded at start-up; sourced
//! item names are read from the database.

use crate::{bot::BotData, core::sourcing, errors::Error};

/// Discord's limit on autocomplete choices.
const MAX_CHOICES: usize = 25;

fn matching<'a>(candidates: impl Iterator<Item = &'a str>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = candidates
        .filter(|candidate| candidate.to_lowercase().contains(&partial_lower))
        .map(str::to_string)
        .take(MAX_CHOICES)
        .collect();

    // Sort alphabetically for consistent UX
    matching.sort();
    matching
}

/// Suggests product type ids matching the user's partial input.
#[allow(clippy::unused_async)] // poise awaits autocomplete callbacks
pub async fn autocomplete_product_type(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let catalog = ctx.data().pricing.catalog();
    matching(
        catalog.product_types().iter().map(|pt| pt.id.as_str()),
        partial,
    )
}

/// Suggests variant ids matching the user's partial input.
///
/// Autocomplete does not see the other options of the command, so variants of
/// every product type are offered.
#[allow(clippy::unused_async)] // poise awaits autocomplete callbacks
pub async fn autocomplete_variant(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let catalog = ctx.data().pricing.catalog();
    matching(
        catalog
            .product_types()
            .iter()
            .flat_map(|pt| pt.variants.iter().map(|v| v.id.as_str())),
        partial,
    )
}

/// Suggests service categories matching the user's partial input.
#[allow(clippy::unused_async)] // poise awaits autocomplete callbacks
pub async fn autocomplete_service_category(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let catalog = ctx.data().pricing.catalog();
    matching(catalog.service_categories().into_iter(), partial)
}

/// Suggests sourced item names matching the user's partial input.
pub async fn autocomplete_sourced_item(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(items) = sourcing::get_all_sourced_items(&ctx.data().database).await else {
        return Vec::new();
    };
    matching(items.iter().map(|item| item.name.as_str()), partial)
}
