//! Database configuration module for `PriceDesk`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{PriceOverride, SourcedItem, price_override};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema, sea_query::Index};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/pricedesk.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back to
/// a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// When the default URL is used, the `data/` directory is created first.
///
/// # Errors
/// Returns an error if the directory cannot be created or the database cannot be opened.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if database_url == DEFAULT_DATABASE_URL {
        std::fs::create_dir_all("data")?;
    }

    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables (if missing) from the entity definitions, plus the lookup index
/// on `price_overrides (product_type_id, variant_id, is_active)`.
///
/// # Errors
/// Returns an error if any DDL statement fails.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut override_table = schema.create_table_from_entity(PriceOverride);
    let mut sourced_item_table = schema.create_table_from_entity(SourcedItem);
    override_table.if_not_exists();
    sourced_item_table.if_not_exists();

    db.execute(builder.build(&override_table)).await?;
    db.execute(builder.build(&sourced_item_table)).await?;

    let pair_index = Index::create()
        .if_not_exists()
        .name("idx_price_overrides_pair_active")
        .table(PriceOverride)
        .col(price_override::Column::ProductTypeId)
        .col(price_override::Column::VariantId)
        .col(price_override::Column::IsActive)
        .to_owned();
    db.execute(builder.build(&pair_index)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{PriceOverrideModel, SourcedItemModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<PriceOverrideModel> = PriceOverride::find().limit(1).all(&db).await?;
        let _: Vec<SourcedItemModel> = SourcedItem::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
