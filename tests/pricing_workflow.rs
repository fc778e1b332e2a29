//! End-to-end pricing workflows through the public API: configuration parsing,
//! price saves, history and bulk rewrites on both repository backends.

#![allow(clippy::unwrap_used)]
#![allow(clippy::float_cmp)]

use pricedesk::{
    config::{database, settings},
    core::{
        catalog::ScopeFilter,
        overrides::SkipReason,
        service::{BulkOutcome, PriceInput, PricingService, SetPriceOutcome, SetPriceRequest},
        store::{DbOverrideRepository, MemoryOverrideRepository, OverrideRepository},
    },
    errors::{Error, Result},
};
use std::sync::Arc;

const CONFIG: &str = r#"
    [pricing]
    default_margin = 25.0
    warning_margin = 15.0
    confirmation_margin = 10.0
    currency = "JPY"

    [[product_types]]
    id = "nvr"
    name = "NVR systems"
    service_category = "surveillance"

    [[product_types.variants]]
    id = "nvr-8ch"
    name = "NVR 8-channel"
    recommended = true

    [[product_types.variants]]
    id = "nvr-16ch"
    name = "NVR 16-channel"

    [[product_types]]
    id = "card-reader"
    name = "Card readers"
    service_category = "access-control"

    [[product_types.variants]]
    id = "reader-mifare"
    name = "MIFARE reader"
"#;

fn service_over<R: OverrideRepository>(repository: R) -> PricingService<R> {
    let (catalog, pricing) = settings::parse_config(CONFIG)
        .and_then(settings::AppConfig::into_parts)
        .unwrap();
    PricingService::new(repository, Arc::new(catalog), pricing)
}

fn request(variant_id: &str, cost_price: f64, price: PriceInput) -> SetPriceRequest {
    let product_type_id = if variant_id.starts_with("nvr") {
        "nvr"
    } else {
        "card-reader"
    };
    SetPriceRequest {
        product_type_id: product_type_id.to_string(),
        variant_id: variant_id.to_string(),
        cost_price,
        price,
        updated_by: "integration".to_string(),
        confirmed: false,
    }
}

async fn saved<R: OverrideRepository>(
    service: &PricingService<R>,
    request: SetPriceRequest,
) -> Result<pricedesk::entities::PriceOverrideModel> {
    match service.set_price(request).await? {
        SetPriceOutcome::Saved { record, .. } => Ok(record),
        SetPriceOutcome::NeedsConfirmation { margin, .. } => Err(Error::InvalidMargin { margin }),
    }
}

async fn reprice_then_bulk<R: OverrideRepository>(service: PricingService<R>) -> Result<()> {
    let first = saved(&service, request("nvr-8ch", 60000.0, PriceInput::DefaultMargin)).await?;
    assert_eq!(first.unit_price, 80000.0);
    assert_eq!(first.margin, 25.0);

    let second = saved(
        &service,
        request("nvr-8ch", 60000.0, PriceInput::SalePrice(85714.0)),
    )
    .await?;
    assert!((second.margin - 30.0).abs() < 0.01);

    let history = service.price_history("nvr", "nvr-8ch").await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id);
    assert!(history[0].is_active);
    assert!(!history[1].is_active);

    saved(&service, request("reader-mifare", 3000.0, PriceInput::Margin(40.0))).await?;

    let report = service
        .bulk_set_margin(
            50.0,
            &ScopeFilter::ServiceCategory("surveillance".to_string()),
            "integration",
            false,
        )
        .await?
        .into_report()
        .unwrap();
    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.applied[0].unit_price, 120_000.0);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].variant_id, "nvr-16ch");
    assert_eq!(report.skipped[0].reason, SkipReason::NotPriced);

    // Out-of-scope pairs keep their price
    let reader = service
        .get_active_price("card-reader", "reader-mifare")
        .await?
        .unwrap();
    assert_eq!(reader.unit_price, 5000.0);

    assert!(service.get_active_price("nvr", "nvr-16ch").await?.is_none());
    assert_eq!(service.price_history("nvr", "nvr-8ch").await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_workflow_in_memory() -> Result<()> {
    reprice_then_bulk(service_over(MemoryOverrideRepository::new())).await
}

#[tokio::test]
async fn test_workflow_on_sqlite() -> Result<()> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    database::create_tables(&db).await?;
    reprice_then_bulk(service_over(DbOverrideRepository::new(db))).await
}

#[tokio::test]
async fn test_low_margin_needs_confirmation() -> Result<()> {
    let service = service_over(MemoryOverrideRepository::new());

    let outcome = service
        .set_price(request("nvr-16ch", 1000.0, PriceInput::Margin(5.0)))
        .await?;
    assert!(matches!(outcome, SetPriceOutcome::NeedsConfirmation { .. }));
    assert!(service.get_active_price("nvr", "nvr-16ch").await?.is_none());

    let mut confirmed = request("nvr-16ch", 1000.0, PriceInput::Margin(5.0));
    confirmed.confirmed = true;
    let record = saved(&service, confirmed).await?;
    assert_eq!(record.unit_price, 1053.0);
    Ok(())
}

#[tokio::test]
async fn test_invalid_bulk_margin_writes_nothing() -> Result<()> {
    let service = service_over(MemoryOverrideRepository::new());
    saved(&service, request("nvr-8ch", 60000.0, PriceInput::DefaultMargin)).await?;

    let result = service
        .bulk_set_margin(100.0, &ScopeFilter::All, "integration", true)
        .await;
    assert!(matches!(result, Err(Error::InvalidMargin { .. })));
    assert_eq!(service.price_history("nvr", "nvr-8ch").await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_low_bulk_margin_needs_confirmation() -> Result<()> {
    let service = service_over(MemoryOverrideRepository::new());
    saved(&service, request("nvr-8ch", 1000.0, PriceInput::Margin(30.0))).await?;

    let outcome = service
        .bulk_set_margin(5.0, &ScopeFilter::All, "integration", false)
        .await?;
    assert!(matches!(outcome, BulkOutcome::NeedsConfirmation { .. }));
    assert_eq!(service.price_history("nvr", "nvr-8ch").await?.len(), 1);

    let report = service
        .bulk_set_margin(5.0, &ScopeFilter::All, "integration", true)
        .await?
        .into_report()
        .unwrap();
    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.applied[0].unit_price, 1053.0);
    Ok(())
}
