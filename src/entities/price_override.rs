//! Price override entity - One persisted sale price assignment for a (product type, variant) pair.
//!
//! Records are append-only: saving a price inserts a new row and flips the previous
//! active row for the same pair to inactive. At most one row per pair has `is_active = true`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Price override database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_overrides")]
pub struct Model {
    /// UUID v4 identifier assigned when the record is stamped
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Catalog product type (e.g., `"nvr"`)
    pub product_type_id: String,
    /// Variant within the product type (e.g., `"nvr-8ch"`)
    pub variant_id: String,
    /// Sale price charged per unit
    pub unit_price: f64,
    /// Acquisition cost per unit in local currency
    pub cost_price: f64,
    /// Realized gross margin percentage, stored for display
    pub margin: f64,
    /// ISO currency code of `unit_price` and `cost_price`
    pub currency: String,
    /// When this price became effective
    pub valid_from: DateTime,
    /// Declared for compatibility; nothing expires records
    pub valid_until: Option<DateTime>,
    /// Whether this is the authoritative price for its pair
    pub is_active: bool,
    /// When the record was written
    pub last_updated: DateTime,
    /// Who saved the price (Discord user id or `"system"`)
    pub updated_by: String,
}

/// `PriceOverride` has no relationships; catalog data lives in configuration
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
