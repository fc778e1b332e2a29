//! Override repositories - Where price override records live.
//!
//! The engine talks to storage only through [`OverrideRepository`]: append a record,
//! read records back (all, or for one pair), and supersede the active record for a
//! pair. `supersede` is the single write path used by the pricing service. It runs
//! deactivate-and-insert as one atomic step and refuses to proceed when the active
//! record is no longer the one the caller read, so two racing writers cannot both
//! leave an active record behind.

use crate::{
    core::{
        overrides::{self, PriceOverrideInput},
        pricing,
    },
    entities::{PriceOverride, price_override},
    errors::{Error, Result},
};
use async_trait::async_trait;
use sea_orm::{
    DatabaseConnection, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Storage for price override history.
#[async_trait]
pub trait OverrideRepository: Send + Sync {
    /// Every record, all pairs, active and inactive.
    async fn all(&self) -> Result<Vec<price_override::Model>>;

    /// Appends a record as-is, without touching other records.
    ///
    /// Intended for imports and replays; regular price saves go through
    /// [`OverrideRepository::supersede`].
    ///
    /// # Errors
    /// Returns `InvalidCost`, `InvalidPrice` or `InvalidMargin` without storing
    /// anything when the record's prices are negative or not finite.
    async fn append(&self, record: price_override::Model) -> Result<price_override::Model>;

    /// Every record for one pair, newest first.
    async fn query_by_pair(
        &self,
        product_type_id: &str,
        variant_id: &str,
    ) -> Result<Vec<price_override::Model>>;

    /// The active record for a pair, if any.
    async fn active(
        &self,
        product_type_id: &str,
        variant_id: &str,
    ) -> Result<Option<price_override::Model>> {
        Ok(self
            .query_by_pair(product_type_id, variant_id)
            .await?
            .into_iter()
            .find(|r| r.is_active))
    }

    /// Atomically deactivates the pair's active record(s) and inserts `input` as the
    /// new active record.
    ///
    /// `expected_previous` is the id of the active record the caller based its write
    /// on (`None` if the pair was unpriced).
    ///
    /// # Errors
    /// Returns `Error::ConcurrentUpdate` without writing anything if the currently
    /// active record differs from `expected_previous`.
    async fn supersede(
        &self,
        input: PriceOverrideInput,
        expected_previous: Option<&str>,
    ) -> Result<price_override::Model>;
}

fn check_expected(
    input: &PriceOverrideInput,
    expected: Option<&str>,
    found: Option<&str>,
) -> Result<()> {
    if expected == found {
        return Ok(());
    }
    Err(Error::ConcurrentUpdate {
        product_type_id: input.product_type_id.clone(),
        variant_id: input.variant_id.clone(),
        expected: expected.map(str::to_string),
        found: found.map(str::to_string),
    })
}

/// Checks an imported record's numbers. Stored margins may be negative (sale price
/// below cost), so only finiteness is required of them.
fn validate_record(record: &price_override::Model) -> Result<()> {
    pricing::validate_cost(record.cost_price)?;
    pricing::validate_sale_price(record.unit_price)?;
    if !record.margin.is_finite() {
        return Err(Error::InvalidMargin {
            margin: record.margin,
        });
    }
    Ok(())
}

/// Process-local repository backed by a `Vec` behind a write lock.
#[derive(Debug, Default)]
pub struct MemoryOverrideRepository {
    records: RwLock<Vec<price_override::Model>>,
}

impl MemoryOverrideRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-loaded with existing history.
    #[must_use]
    pub fn with_records(records: Vec<price_override::Model>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl OverrideRepository for MemoryOverrideRepository {
    async fn all(&self) -> Result<Vec<price_override::Model>> {
        Ok(self.records.read().await.clone())
    }

    async fn append(&self, record: price_override::Model) -> Result<price_override::Model> {
        validate_record(&record)?;
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn query_by_pair(
        &self,
        product_type_id: &str,
        variant_id: &str,
    ) -> Result<Vec<price_override::Model>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| r.product_type_id == product_type_id && r.variant_id == variant_id)
            .cloned()
            .collect())
    }

    async fn active(
        &self,
        product_type_id: &str,
        variant_id: &str,
    ) -> Result<Option<price_override::Model>> {
        Ok(
            overrides::get_active_price(&self.records.read().await, product_type_id, variant_id)
                .cloned(),
        )
    }

    async fn supersede(
        &self,
        input: PriceOverrideInput,
        expected_previous: Option<&str>,
    ) -> Result<price_override::Model> {
        let mut records = self.records.write().await;

        let found = overrides::get_active_price(
            &records,
            &input.product_type_id,
            &input.variant_id,
        )
        .map(|r| r.id.clone());
        check_expected(&input, expected_previous, found.as_deref())?;

        let updated = overrides::apply_price_override(std::mem::take(&mut *records), input);
        *records = updated;

        records
            .last()
            .cloned()
            .ok_or(Error::Database(DbErr::RecordNotInserted))
    }
}

/// Repository backed by the `price_overrides` table.
#[derive(Debug, Clone)]
pub struct DbOverrideRepository {
    db: DatabaseConnection,
}

impl DbOverrideRepository {
    /// Wraps an open database connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn into_active_model(record: price_override::Model) -> price_override::ActiveModel {
    price_override::ActiveModel {
        id: Set(record.id),
        product_type_id: Set(record.product_type_id),
        variant_id: Set(record.variant_id),
        unit_price: Set(record.unit_price),
        cost_price: Set(record.cost_price),
        margin: Set(record.margin),
        currency: Set(record.currency),
        valid_from: Set(record.valid_from),
        valid_until: Set(record.valid_until),
        is_active: Set(record.is_active),
        last_updated: Set(record.last_updated),
        updated_by: Set(record.updated_by),
    }
}

#[async_trait]
impl OverrideRepository for DbOverrideRepository {
    async fn all(&self) -> Result<Vec<price_override::Model>> {
        PriceOverride::find()
            .order_by_asc(price_override::Column::LastUpdated)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn append(&self, record: price_override::Model) -> Result<price_override::Model> {
        validate_record(&record)?;
        PriceOverride::insert(into_active_model(record.clone()))
            .exec_without_returning(&self.db)
            .await?;
        Ok(record)
    }

    async fn query_by_pair(
        &self,
        product_type_id: &str,
        variant_id: &str,
    ) -> Result<Vec<price_override::Model>> {
        PriceOverride::find()
            .filter(price_override::Column::ProductTypeId.eq(product_type_id))
            .filter(price_override::Column::VariantId.eq(variant_id))
            .order_by_desc(price_override::Column::LastUpdated)
            .order_by_desc(price_override::Column::IsActive)
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn active(
        &self,
        product_type_id: &str,
        variant_id: &str,
    ) -> Result<Option<price_override::Model>> {
        PriceOverride::find()
            .filter(price_override::Column::ProductTypeId.eq(product_type_id))
            .filter(price_override::Column::VariantId.eq(variant_id))
            .filter(price_override::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn supersede(
        &self,
        input: PriceOverrideInput,
        expected_previous: Option<&str>,
    ) -> Result<price_override::Model> {
        // Use a transaction so the check, the deactivation and the insert land together
        let txn = self.db.begin().await?;

        let found = PriceOverride::find()
            .filter(price_override::Column::ProductTypeId.eq(input.product_type_id.as_str()))
            .filter(price_override::Column::VariantId.eq(input.variant_id.as_str()))
            .filter(price_override::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .map(|r| r.id);
        check_expected(&input, expected_previous, found.as_deref())?;

        let deactivated = PriceOverride::update_many()
            .col_expr(price_override::Column::IsActive, Expr::value(false))
            .filter(price_override::Column::ProductTypeId.eq(input.product_type_id.as_str()))
            .filter(price_override::Column::VariantId.eq(input.variant_id.as_str()))
            .filter(price_override::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;

        let record = input.stamp(chrono::Utc::now().naive_utc());
        PriceOverride::insert(into_active_model(record.clone()))
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;

        debug!(
            deactivated = deactivated.rows_affected,
            "Deactivated previous price records"
        );
        info!(
            id = %record.id,
            product_type_id = %record.product_type_id,
            variant_id = %record.variant_id,
            unit_price = record.unit_price,
            "Stored price override"
        );
        Ok(record)
    }
}
