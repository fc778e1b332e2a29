//! Override store sync and bulk rewrite over an in-memory record list.
//!
//! These functions take the full override history (all pairs, active and inactive),
//! and return the updated history. They never remove records: saving a price appends
//! one record and deactivates every earlier record for the same pair, so exactly one
//! active record per touched pair remains.

use crate::{
    core::{catalog::ProductType, pricing},
    entities::price_override,
    errors::Result,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Fields supplied by a caller when saving a price. Identity, timestamps and the
/// active flag are stamped on write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceOverrideInput {
    /// Catalog product type
    pub product_type_id: String,
    /// Variant within the product type
    pub variant_id: String,
    /// Sale price per unit
    pub unit_price: f64,
    /// Cost price per unit
    pub cost_price: f64,
    /// Gross margin percentage
    pub margin: f64,
    /// Currency code
    pub currency: String,
    /// Actor saving the price
    pub updated_by: String,
}

impl PriceOverrideInput {
    /// Turns the input into an active record with a fresh UUID and `now` as both
    /// `valid_from` and `last_updated`.
    #[must_use]
    pub fn stamp(self, now: NaiveDateTime) -> price_override::Model {
        price_override::Model {
            id: Uuid::new_v4().to_string(),
            product_type_id: self.product_type_id,
            variant_id: self.variant_id,
            unit_price: self.unit_price,
            cost_price: self.cost_price,
            margin: self.margin,
            currency: self.currency,
            valid_from: now,
            valid_until: None,
            is_active: true,
            last_updated: now,
            updated_by: self.updated_by,
        }
    }

    /// Whether a record belongs to the same (product type, variant) pair.
    #[must_use]
    pub fn same_pair(&self, record: &price_override::Model) -> bool {
        record.product_type_id == self.product_type_id && record.variant_id == self.variant_id
    }
}

/// Saves a new price for a pair and returns the full updated history.
///
/// Every existing record for the pair is deactivated, however many there are, so a
/// store that somehow ended up with two active records is repaired by the next save.
#[must_use]
pub fn apply_price_override(
    mut store: Vec<price_override::Model>,
    input: PriceOverrideInput,
) -> Vec<price_override::Model> {
    let now = chrono::Utc::now().naive_utc();

    for record in store.iter_mut().filter(|r| input.same_pair(r)) {
        record.is_active = false;
    }

    store.push(input.stamp(now));
    store
}

/// Returns the active record for a pair, or `None` if the pair was never priced.
///
/// When more than one active record exists the first one found is returned.
#[must_use]
pub fn get_active_price<'a>(
    store: &'a [price_override::Model],
    product_type_id: &str,
    variant_id: &str,
) -> Option<&'a price_override::Model> {
    store.iter().find(|r| {
        r.is_active && r.product_type_id == product_type_id && r.variant_id == variant_id
    })
}

/// Why a bulk rewrite left a variant alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The variant has no active price record
    NotPriced,
    /// The active record carries a zero cost price, so nothing can be derived
    MissingCost,
    /// The active record carries a negative or non-finite cost price
    InvalidCost,
}

/// A variant a bulk rewrite did not touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedVariant {
    /// Catalog product type
    pub product_type_id: String,
    /// Variant within the product type
    pub variant_id: String,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// Outcome of a bulk rewrite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkReport {
    /// Margin the rewrite applied
    pub target_margin: f64,
    /// Newly written active records, one per rewritten variant
    pub applied: Vec<price_override::Model>,
    /// Variants left untouched
    pub skipped: Vec<SkippedVariant>,
}

impl BulkReport {
    /// An empty report for `target_margin`.
    #[must_use]
    pub const fn new(target_margin: f64) -> Self {
        Self {
            target_margin,
            applied: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

/// What a bulk rewrite should do with one variant.
#[derive(Debug, Clone, PartialEq)]
pub enum RewriteDecision {
    /// Save this input
    Apply(PriceOverrideInput),
    /// Leave the variant alone
    Skip(SkipReason),
}

/// Decides how one variant is rewritten at `target_margin`, given its active record.
///
/// The new record keeps the existing cost and currency; only the sale price and the
/// stored margin change. A rewrite never invents a cost price.
///
/// A stored cost that is negative or not finite is skipped rather than failing, so
/// one bad record cannot stop a batch.
///
/// # Errors
/// Returns `Error::InvalidMargin` if `target_margin` is out of range.
pub fn rewrite_decision(
    active: Option<&price_override::Model>,
    target_margin: f64,
    updated_by: &str,
) -> Result<RewriteDecision> {
    let Some(active) = active else {
        return Ok(RewriteDecision::Skip(SkipReason::NotPriced));
    };

    if pricing::validate_cost(active.cost_price).is_err() {
        return Ok(RewriteDecision::Skip(SkipReason::InvalidCost));
    }
    if active.cost_price == 0.0 {
        return Ok(RewriteDecision::Skip(SkipReason::MissingCost));
    }

    let unit_price = pricing::derive_sale_price(active.cost_price, target_margin)?;

    Ok(RewriteDecision::Apply(PriceOverrideInput {
        product_type_id: active.product_type_id.clone(),
        variant_id: active.variant_id.clone(),
        unit_price,
        cost_price: active.cost_price,
        margin: target_margin,
        currency: active.currency.clone(),
        updated_by: updated_by.to_string(),
    }))
}

/// Re-derives the sale price of every priced variant in `scope` at `target_margin`.
///
/// The margin is validated before anything is touched. Variants without an active
/// record, or whose record has no cost, are skipped and listed in the report.
///
/// # Errors
/// Returns `Error::InvalidMargin` for a margin outside `[0, 99]`. The store is
/// consumed either way, so callers that need it after a failure pass a clone.
pub fn bulk_apply_margin(
    mut store: Vec<price_override::Model>,
    target_margin: f64,
    scope: &[ProductType],
    updated_by: &str,
) -> Result<(Vec<price_override::Model>, BulkReport)> {
    let target_margin = pricing::validate_margin(target_margin)?;
    let mut report = BulkReport::new(target_margin);

    for product_type in scope {
        for variant in &product_type.variants {
            let active = get_active_price(&store, &product_type.id, &variant.id);
            match rewrite_decision(active, target_margin, updated_by)? {
                RewriteDecision::Apply(input) => {
                    store = apply_price_override(store, input);
                    if let Some(record) = store.last() {
                        report.applied.push(record.clone());
                    }
                }
                RewriteDecision::Skip(reason) => {
                    debug!(
                        product_type_id = %product_type.id,
                        variant_id = %variant.id,
                        ?reason,
                        "Bulk rewrite skipped variant"
                    );
                    report.skipped.push(SkippedVariant {
                        product_type_id: product_type.id.clone(),
                        variant_id: variant.id.clone(),
                        reason,
                    });
                }
            }
        }
    }

    Ok((store, report))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::errors::Error;
    use crate::test_utils::{override_input, sample_catalog};

    fn active_count(store: &[price_override::Model], pt: &str, v: &str) -> usize {
        store
            .iter()
            .filter(|r| r.is_active && r.product_type_id == pt && r.variant_id == v)
            .count()
    }

    #[test]
    fn test_apply_stamps_new_record() {
        let store = apply_price_override(Vec::new(), override_input("nvr", "nvr-8ch", 60000.0, 30.0));
        assert_eq!(store.len(), 1);
        let record = &store[0];
        assert!(record.is_active);
        assert_eq!(record.unit_price, 85714.0);
        assert_eq!(record.valid_from, record.last_updated);
        assert!(record.valid_until.is_none());
        assert!(Uuid::parse_str(&record.id).is_ok());
    }

    #[test]
    fn test_single_active_record_per_pair_after_each_call() {
        let mut store = Vec::new();
        for (i, cost) in [1000.0, 1100.0, 1200.0, 1300.0].into_iter().enumerate() {
            store = apply_price_override(store, override_input("nvr", "nvr-8ch", cost, 25.0));
            assert_eq!(store.len(), i + 1);
            assert_eq!(active_count(&store, "nvr", "nvr-8ch"), 1);
        }
        let active = get_active_price(&store, "nvr", "nvr-8ch").unwrap();
        assert_eq!(active.cost_price, 1300.0);
    }

    #[test]
    fn test_apply_leaves_other_pairs_alone() {
        let store = apply_price_override(Vec::new(), override_input("nvr", "nvr-4ch", 500.0, 20.0));
        let store = apply_price_override(store, override_input("nvr", "nvr-8ch", 800.0, 20.0));
        assert_eq!(active_count(&store, "nvr", "nvr-4ch"), 1);
        assert_eq!(active_count(&store, "nvr", "nvr-8ch"), 1);
    }

    #[test]
    fn test_apply_repairs_duplicate_active_records() {
        let now = chrono::Utc::now().naive_utc();
        let store = vec![
            override_input("nvr", "nvr-8ch", 1000.0, 20.0).stamp(now),
            override_input("nvr", "nvr-8ch", 1000.0, 30.0).stamp(now),
        ];
        assert_eq!(active_count(&store, "nvr", "nvr-8ch"), 2);

        let store = apply_price_override(store, override_input("nvr", "nvr-8ch", 1000.0, 40.0));
        assert_eq!(store.len(), 3);
        assert_eq!(active_count(&store, "nvr", "nvr-8ch"), 1);
        assert_eq!(
            get_active_price(&store, "nvr", "nvr-8ch").unwrap().margin,
            40.0
        );
    }

    #[test]
    fn test_get_active_price_none_for_unpriced_pair() {
        assert!(get_active_price(&[], "nvr", "nvr-8ch").is_none());
    }

    #[test]
    fn test_bulk_rewrite_scenario() {
        let catalog = sample_catalog();
        let scope = catalog.scope(&crate::core::catalog::ScopeFilter::ProductType(
            "nvr".to_string(),
        ));
        // nvr has three variants; price two of them
        let store = apply_price_override(Vec::new(), override_input("nvr", "nvr-4ch", 1000.0, 20.0));
        let store = apply_price_override(store, override_input("nvr", "nvr-8ch", 2000.0, 20.0));

        let (store, report) = bulk_apply_margin(store, 40.0, &scope, "admin").unwrap();

        assert_eq!(report.applied.len(), 2);
        assert_eq!(store.len(), 4);
        assert_eq!(
            get_active_price(&store, "nvr", "nvr-4ch").unwrap().unit_price,
            1667.0
        );
        assert_eq!(
            get_active_price(&store, "nvr", "nvr-8ch").unwrap().unit_price,
            3333.0
        );
        assert!(get_active_price(&store, "nvr", "nvr-16ch").is_none());
        assert_eq!(
            report.skipped,
            vec![SkippedVariant {
                product_type_id: "nvr".to_string(),
                variant_id: "nvr-16ch".to_string(),
                reason: SkipReason::NotPriced,
            }]
        );
        for record in &report.applied {
            assert_eq!(record.margin, 40.0);
            assert_eq!(record.updated_by, "admin");
        }
    }

    #[test]
    fn test_bulk_rewrite_keeps_cost() {
        let catalog = sample_catalog();
        let store = apply_price_override(Vec::new(), override_input("nvr", "nvr-4ch", 1000.0, 20.0));
        let (store, _) = bulk_apply_margin(store, 50.0, catalog.product_types(), "admin").unwrap();
        let active = get_active_price(&store, "nvr", "nvr-4ch").unwrap();
        assert_eq!(active.cost_price, 1000.0);
        assert_eq!(active.unit_price, 2000.0);
    }

    #[test]
    fn test_bulk_rewrite_skips_zero_cost() {
        let catalog = sample_catalog();
        let mut input = override_input("nvr", "nvr-4ch", 0.0, 0.0);
        input.unit_price = 500.0;
        let store = apply_price_override(Vec::new(), input);

        let (store, report) =
            bulk_apply_margin(store, 30.0, catalog.product_types(), "admin").unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(store.len(), 1);
        assert!(report.skipped.contains(&SkippedVariant {
            product_type_id: "nvr".to_string(),
            variant_id: "nvr-4ch".to_string(),
            reason: SkipReason::MissingCost,
        }));
    }

    #[test]
    fn test_bulk_rewrite_skips_bad_stored_cost_and_continues() {
        let catalog = sample_catalog();
        let now = chrono::Utc::now().naive_utc();
        let mut bad = override_input("nvr", "nvr-4ch", 1000.0, 20.0).stamp(now);
        bad.cost_price = -5.0;
        let store = apply_price_override(vec![bad], override_input("nvr", "nvr-8ch", 1000.0, 20.0));

        let (store, report) =
            bulk_apply_margin(store, 40.0, catalog.product_types(), "admin").unwrap();
        assert_eq!(report.applied.len(), 1);
        assert_eq!(report.applied[0].variant_id, "nvr-8ch");
        assert_eq!(report.applied[0].unit_price, 1667.0);
        assert!(report.skipped.contains(&SkippedVariant {
            product_type_id: "nvr".to_string(),
            variant_id: "nvr-4ch".to_string(),
            reason: SkipReason::InvalidCost,
        }));
        assert_eq!(get_active_price(&store, "nvr", "nvr-4ch").unwrap().cost_price, -5.0);
    }

    #[test]
    fn test_bulk_rewrite_new_records_match_priced_variants() {
        let catalog = sample_catalog();
        let mut store = Vec::new();
        store = apply_price_override(store, override_input("nvr", "nvr-4ch", 1000.0, 20.0));
        store = apply_price_override(store, override_input("camera", "cam-dome", 300.0, 20.0));
        store = apply_price_override(store, override_input("card-reader", "reader-mifare", 90.0, 20.0));
        let before = store.len();

        let (store, report) =
            bulk_apply_margin(store, 35.0, catalog.product_types(), "admin").unwrap();
        assert_eq!(report.applied.len(), 3);
        assert_eq!(store.len(), before + 3);
        let variant_total: usize = catalog.product_types().iter().map(|pt| pt.variants.len()).sum();
        assert_eq!(report.skipped.len(), variant_total - 3);
    }

    #[test]
    fn test_bulk_rewrite_empty_scope_is_noop() {
        let store = apply_price_override(Vec::new(), override_input("nvr", "nvr-4ch", 1000.0, 20.0));
        let original = store.clone();
        let (store, report) = bulk_apply_margin(store, 40.0, &[], "admin").unwrap();
        assert_eq!(store, original);
        assert!(report.applied.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_bulk_rewrite_rejects_invalid_margin() {
        let catalog = sample_catalog();
        let store = apply_price_override(Vec::new(), override_input("nvr", "nvr-4ch", 1000.0, 20.0));
        for margin in [-1.0, 99.5, 100.0, 150.0] {
            let result = bulk_apply_margin(store.clone(), margin, catalog.product_types(), "admin");
            assert!(matches!(result, Err(Error::InvalidMargin { .. })));
        }
    }
}
