//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod price_override;
pub mod sourced_item;

// Re-export specific types to avoid conflicts
pub use price_override::{
    Column as PriceOverrideColumn, Entity as PriceOverride, Model as PriceOverrideModel,
};
pub use sourced_item::{
    Column as SourcedItemColumn, Entity as SourcedItem, Model as SourcedItemModel,
};
