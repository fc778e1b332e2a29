//! Shared test utilities for `PriceDesk`.
//!
//! This module provides common helper functions for setting up test databases,
//! a small reference catalog, and price inputs with sensible defaults.

#![allow(clippy::expect_used)]

use crate::{
    config::pricing::PricingSettings,
    core::{
        catalog::{Catalog, ProductType, ProductVariant},
        overrides::PriceOverrideInput,
        pricing,
        service::{PriceInput, PricingService, SetPriceRequest},
        sourcing::{self, NewSourcedItem},
        store::{DbOverrideRepository, MemoryOverrideRepository},
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

fn variant(id: &str, name: &str, recommended: bool) -> ProductVariant {
    ProductVariant {
        id: id.to_string(),
        name: name.to_string(),
        specs: Vec::new(),
        recommended,
    }
}

/// A three-type catalog used across tests.
///
/// * `nvr` (surveillance): `nvr-4ch`, `nvr-8ch` (recommended), `nvr-16ch`
/// * `camera` (surveillance): `cam-dome`, `cam-bullet`
/// * `card-reader` (access-control): `reader-mifare`, `reader-biometric`
#[must_use]
pub fn sample_catalog() -> Catalog {
    Catalog::new(vec![
        ProductType {
            id: "nvr".to_string(),
            name: "NVR systems".to_string(),
            service_category: "surveillance".to_string(),
            variants: vec![
                variant("nvr-4ch", "NVR 4-channel", false),
                variant("nvr-8ch", "NVR 8-channel", true),
                variant("nvr-16ch", "NVR 16-channel", false),
            ],
        },
        ProductType {
            id: "camera".to_string(),
            name: "IP cameras".to_string(),
            service_category: "surveillance".to_string(),
            variants: vec![
                variant("cam-dome", "Dome camera 4MP", true),
                variant("cam-bullet", "Bullet camera 4MP", false),
            ],
        },
        ProductType {
            id: "card-reader".to_string(),
            name: "Card readers".to_string(),
            service_category: "access-control".to_string(),
            variants: vec![
                variant("reader-mifare", "MIFARE reader", true),
                variant("reader-biometric", "Biometric reader", false),
            ],
        },
    ])
    .expect("sample catalog is valid")
}

/// Builds a price input whose sale price is derived from `cost` and `margin`.
///
/// # Defaults
/// * `currency`: `"JPY"`
/// * `updated_by`: `"tester"`
#[must_use]
pub fn override_input(
    product_type_id: &str,
    variant_id: &str,
    cost: f64,
    margin: f64,
) -> PriceOverrideInput {
    PriceOverrideInput {
        product_type_id: product_type_id.to_string(),
        variant_id: variant_id.to_string(),
        unit_price: pricing::derive_sale_price(cost, margin).expect("valid test price"),
        cost_price: cost,
        margin,
        currency: "JPY".to_string(),
        updated_by: "tester".to_string(),
    }
}

/// Builds an unconfirmed `set_price` request from `"tester"`.
#[must_use]
pub fn set_price_request(
    product_type_id: &str,
    variant_id: &str,
    cost_price: f64,
    price: PriceInput,
) -> SetPriceRequest {
    SetPriceRequest {
        product_type_id: product_type_id.to_string(),
        variant_id: variant_id.to_string(),
        cost_price,
        price,
        updated_by: "tester".to_string(),
        confirmed: false,
    }
}

/// A pricing service over an empty in-memory repository with default settings.
#[must_use]
pub fn memory_service() -> PricingService<MemoryOverrideRepository> {
    PricingService::new(
        MemoryOverrideRepository::new(),
        Arc::new(sample_catalog()),
        PricingSettings::default(),
    )
}

/// A pricing service over the `price_overrides` table with default settings.
#[must_use]
pub fn db_service(db: DatabaseConnection) -> PricingService<DbOverrideRepository> {
    PricingService::new(
        DbOverrideRepository::new(db),
        Arc::new(sample_catalog()),
        PricingSettings::default(),
    )
}

/// Creates a sourced item with sensible defaults.
///
/// # Defaults
/// * `foreign_price`: 10.0
/// * `foreign_currency`: `"USD"`
/// * `margin`: None (configured default)
/// * not linked to a catalog pair
pub async fn create_test_sourced_item(
    db: &DatabaseConnection,
    name: &str,
    exchange_rate: Option<f64>,
    auto_price: bool,
) -> Result<entities::sourced_item::Model> {
    sourcing::create_sourced_item(
        db,
        &PricingSettings::default(),
        NewSourcedItem {
            name: name.to_string(),
            foreign_price: 10.0,
            foreign_currency: "USD".to_string(),
            exchange_rate,
            margin: None,
            auto_price,
            catalog_pair: None,
        },
    )
    .await
}
