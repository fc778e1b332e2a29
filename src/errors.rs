//! Unified error type for `PriceDesk`.
//!
//! Validation failures (`InvalidMargin`, `InvalidCost`, `InvalidPrice`) are raised
//! before any store mutation. A missing active price is not an error: lookups
//! return `Ok(None)` and bulk rewrites report skipped variants instead.

use thiserror::Error;

/// All errors produced by the pricing engine, its stores and the Discord layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of what went wrong
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Margin outside `[0, 99]` or not a finite number
    #[error("Invalid margin: {margin}% (must be between 0 and 99)")]
    InvalidMargin {
        /// The rejected margin percentage
        margin: f64,
    },

    /// Negative or non-finite cost price
    #[error("Invalid cost price: {cost}")]
    InvalidCost {
        /// The rejected cost
        cost: f64,
    },

    /// Negative or non-finite sale price
    #[error("Invalid sale price: {price}")]
    InvalidPrice {
        /// The rejected sale price
        price: f64,
    },

    /// No product type with this identifier in the catalog
    #[error("Product type '{id}' not found")]
    ProductTypeNotFound {
        /// Requested product type identifier
        id: String,
    },

    /// Product type exists but has no such variant
    #[error("Variant '{variant_id}' not found in product type '{product_type_id}'")]
    VariantNotFound {
        /// Owning product type identifier
        product_type_id: String,
        /// Requested variant identifier
        variant_id: String,
    },

    /// No sourced item with this identifier
    #[error("Sourced item '{id}' not found")]
    SourcedItemNotFound {
        /// Requested sourced item identifier
        id: String,
    },

    /// The active record for a pair changed between read and write
    #[error(
        "Concurrent price update on {product_type_id}/{variant_id}: expected active {expected:?}, found {found:?}"
    )]
    ConcurrentUpdate {
        /// Product type of the contested pair
        product_type_id: String,
        /// Variant of the contested pair
        variant_id: String,
        /// Active record id the writer based its update on
        expected: Option<String>,
        /// Active record id actually present in the store
        found: Option<String>,
    },

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure while formatting a reply
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
