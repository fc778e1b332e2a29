//! Sourced item business logic - Catalog items bought in a foreign currency.
//!
//! An item's local cost is always `foreign_price * exchange_rate`. Changing the rate or
//! the foreign price recomputes the cost; when the item is in auto-price mode the sale
//! price is recomputed from the new cost as well. Items linked to a catalog pair can be
//! published into the price override store through the pricing service.

use crate::{
    config::pricing::PricingSettings,
    core::{
        currency,
        pricing,
        service::{PriceInput, PricingService, SetPriceOutcome, SetPriceRequest},
        store::OverrideRepository,
    },
    entities::{SourcedItem, sourced_item},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Fields for a new sourced item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSourcedItem {
    /// Display name, unique
    pub name: String,
    /// Supplier price in the foreign currency
    pub foreign_price: f64,
    /// ISO code of the supplier currency
    pub foreign_currency: String,
    /// Explicit exchange rate, or `None` for the configured default
    pub exchange_rate: Option<f64>,
    /// Explicit margin, or `None` for the configured default
    pub margin: Option<f64>,
    /// Whether the sale price follows the cost
    pub auto_price: bool,
    /// Optional catalog pair this item prices
    pub catalog_pair: Option<(String, String)>,
}

/// Recomputes the derived cost of an item and, in auto-price mode, its sale price.
///
/// # Errors
/// Returns a validation error if the foreign price, fallback rate or margin is invalid.
/// The item is left unchanged on error.
pub fn recompute(item: &mut sourced_item::Model, settings: &PricingSettings) -> Result<()> {
    let cost_price = currency::derive_local_cost(
        item.foreign_price,
        item.exchange_rate,
        settings.default_exchange_rate,
    )?;
    let sale_price = if item.auto_price {
        pricing::derive_sale_price(cost_price, effective_margin(item, settings))?
    } else {
        item.sale_price
    };

    item.cost_price = cost_price;
    item.sale_price = sale_price;
    Ok(())
}

/// The margin an item prices at: its own, or the configured default.
#[must_use]
pub fn effective_margin(item: &sourced_item::Model, settings: &PricingSettings) -> f64 {
    item.margin.unwrap_or(settings.default_margin)
}

/// Retrieves all sourced items ordered by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_all_sourced_items(db: &DatabaseConnection) -> Result<Vec<sourced_item::Model>> {
    SourcedItem::find()
        .order_by_asc(sourced_item::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a sourced item by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_sourced_item_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<sourced_item::Model>> {
    SourcedItem::find()
        .filter(sourced_item::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn get_existing(db: &DatabaseConnection, item_id: i64) -> Result<sourced_item::Model> {
    SourcedItem::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::SourcedItemNotFound {
            id: item_id.to_string(),
        })
}

/// Creates a sourced item with its cost and sale price derived.
///
/// The initial sale price is derived from the cost at the effective margin regardless
/// of `auto_price`; later cost changes only move it when `auto_price` is set.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The foreign price is negative or not finite
/// - The margin is outside `[0, 99]`
/// - The database insert fails (including a duplicate name)
pub async fn create_sourced_item(
    db: &DatabaseConnection,
    settings: &PricingSettings,
    new_item: NewSourcedItem,
) -> Result<sourced_item::Model> {
    if new_item.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Sourced item name cannot be empty".to_string(),
        });
    }
    if let Some(margin) = new_item.margin {
        pricing::validate_margin(margin)?;
    }

    let cost_price = currency::derive_local_cost(
        new_item.foreign_price,
        new_item.exchange_rate,
        settings.default_exchange_rate,
    )?;
    let margin = new_item.margin.unwrap_or(settings.default_margin);
    let sale_price = pricing::derive_sale_price(cost_price, margin)?;
    let (product_type_id, variant_id) = new_item.catalog_pair.unzip();

    let item = sourced_item::ActiveModel {
        name: Set(new_item.name.trim().to_string()),
        product_type_id: Set(product_type_id),
        variant_id: Set(variant_id),
        foreign_price: Set(new_item.foreign_price),
        foreign_currency: Set(new_item.foreign_currency.trim().to_uppercase()),
        exchange_rate: Set(currency::explicit_rate(new_item.exchange_rate)),
        cost_price: Set(cost_price),
        margin: Set(new_item.margin),
        sale_price: Set(sale_price),
        auto_price: Set(new_item.auto_price),
        updated_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };

    let item = item.insert(db).await?;
    info!(id = item.id, name = %item.name, cost_price, sale_price, "Created sourced item");
    Ok(item)
}

async fn save_recomputed(
    db: &DatabaseConnection,
    settings: &PricingSettings,
    mut item: sourced_item::Model,
) -> Result<sourced_item::Model> {
    recompute(&mut item, settings)?;

    let mut active: sourced_item::ActiveModel = item.clone().into();
    active.foreign_price = Set(item.foreign_price);
    active.exchange_rate = Set(item.exchange_rate);
    active.cost_price = Set(item.cost_price);
    active.margin = Set(item.margin);
    active.sale_price = Set(item.sale_price);
    active.auto_price = Set(item.auto_price);
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    let item = active.update(db).await?;
    info!(
        id = item.id,
        name = %item.name,
        cost_price = item.cost_price,
        sale_price = item.sale_price,
        "Recomputed sourced item"
    );
    Ok(item)
}

/// Sets an item's exchange rate and recomputes its cost (and, in auto-price mode,
/// its sale price). `None`, zero, a negative or a non-finite rate means "use the
/// default rate" and is stored as `None`.
///
/// # Errors
/// Returns `SourcedItemNotFound` or a database error.
pub async fn update_exchange_rate(
    db: &DatabaseConnection,
    settings: &PricingSettings,
    item_id: i64,
    exchange_rate: Option<f64>,
) -> Result<sourced_item::Model> {
    let mut item = get_existing(db, item_id).await?;
    item.exchange_rate = currency::explicit_rate(exchange_rate);
    save_recomputed(db, settings, item).await
}

/// Sets an item's foreign price and recomputes its derived prices.
///
/// # Errors
/// Returns `InvalidCost` for a negative price, `SourcedItemNotFound`, or a
/// database error.
pub async fn update_foreign_price(
    db: &DatabaseConnection,
    settings: &PricingSettings,
    item_id: i64,
    foreign_price: f64,
) -> Result<sourced_item::Model> {
    pricing::validate_cost(foreign_price)?;
    let mut item = get_existing(db, item_id).await?;
    item.foreign_price = foreign_price;
    save_recomputed(db, settings, item).await
}

/// Switches auto-price mode and optionally changes the item margin.
///
/// Turning auto-price on recomputes the sale price immediately.
///
/// # Errors
/// Returns `InvalidMargin`, `SourcedItemNotFound`, or a database error.
pub async fn set_auto_price(
    db: &DatabaseConnection,
    settings: &PricingSettings,
    item_id: i64,
    auto_price: bool,
    margin: Option<f64>,
) -> Result<sourced_item::Model> {
    if let Some(margin) = margin {
        pricing::validate_margin(margin)?;
    }
    let mut item = get_existing(db, item_id).await?;
    item.auto_price = auto_price;
    if margin.is_some() {
        item.margin = margin;
    }
    save_recomputed(db, settings, item).await
}

/// Publishes an item's current cost and sale price as the active price of its
/// catalog pair.
///
/// Returns `Ok(None)` when the item is not linked to a catalog pair.
///
/// # Errors
/// Propagates any error from [`PricingService::set_price`].
pub async fn publish_to_overrides<R: OverrideRepository>(
    service: &PricingService<R>,
    item: &sourced_item::Model,
    updated_by: &str,
    confirmed: bool,
) -> Result<Option<SetPriceOutcome>> {
    let (Some(product_type_id), Some(variant_id)) =
        (item.product_type_id.clone(), item.variant_id.clone())
    else {
        return Ok(None);
    };

    service
        .set_price(SetPriceRequest {
            product_type_id,
            variant_id,
            cost_price: item.cost_price,
            price: PriceInput::SalePrice(item.sale_price),
            updated_by: updated_by.to_string(),
            confirmed,
        })
        .await
        .map(Some)
}
