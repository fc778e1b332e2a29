//! Sourced item entity - A catalog item bought in a foreign currency.
//!
//! The local cost is derived from `foreign_price * exchange_rate`. When `auto_price` is set,
//! the sale price follows the cost at the item's margin (or the configured default margin).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sourced item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sourced_items")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name of the item (e.g., "PoE switch 16-port")
    #[sea_orm(unique)]
    pub name: String,
    /// Optional catalog product type this item prices
    pub product_type_id: Option<String>,
    /// Optional catalog variant this item prices
    pub variant_id: Option<String>,
    /// Supplier price in `foreign_currency`
    pub foreign_price: f64,
    /// ISO code of the supplier currency (e.g., "USD")
    pub foreign_currency: String,
    /// Explicit exchange rate; `None` means the configured default rate applies
    pub exchange_rate: Option<f64>,
    /// Derived local-currency cost, unrounded
    pub cost_price: f64,
    /// Explicit margin; `None` means the configured default margin applies
    pub margin: Option<f64>,
    /// Derived sale price (only recomputed when `auto_price` is set)
    pub sale_price: f64,
    /// Whether the sale price follows cost changes automatically
    pub auto_price: bool,
    /// When the item was last modified
    pub updated_at: DateTime,
}

/// `SourcedItem` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
