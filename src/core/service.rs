//! Pricing service - The caller-facing pricing API.
//!
//! Wraps an [`OverrideRepository`] together with the catalog and pricing settings and
//! exposes `set_price`, `get_active_price`, `price_history` and `bulk_set_margin`.
//! Every successful write is announced on a broadcast channel so other components can
//! refresh their view of current prices instead of polling.

use crate::{
    config::pricing::PricingSettings,
    core::{
        catalog::{Catalog, ScopeFilter},
        overrides::{self, BulkReport, PriceOverrideInput, RewriteDecision, SkippedVariant},
        pricing::{self, MarginAssessment, PriceFields},
        store::OverrideRepository,
    },
    entities::price_override,
    errors::{Error, Result},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// How the caller specifies the sale side of a price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceInput {
    /// An explicit sale price; the margin is derived
    SalePrice(f64),
    /// An explicit margin percentage; the sale price is derived
    Margin(f64),
    /// The configured default margin
    DefaultMargin,
}

/// A request to save one price.
#[derive(Debug, Clone, PartialEq)]
pub struct SetPriceRequest {
    /// Catalog product type
    pub product_type_id: String,
    /// Variant within the product type
    pub variant_id: String,
    /// Cost price per unit
    pub cost_price: f64,
    /// Sale price or margin
    pub price: PriceInput,
    /// Actor saving the price
    pub updated_by: String,
    /// Whether the caller already confirmed a very low margin
    pub confirmed: bool,
}

/// Result of a `set_price` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SetPriceOutcome {
    /// The price was stored
    Saved {
        /// The new active record
        record: price_override::Model,
        /// The record it superseded, if the pair was priced before
        previous: Option<price_override::Model>,
        /// Low-margin classification of the stored price
        assessment: MarginAssessment,
    },
    /// The margin is below the confirmation threshold; nothing was stored
    NeedsConfirmation {
        /// Margin the price would have had
        margin: f64,
        /// Sale price that would have been stored
        unit_price: f64,
    },
}

/// Result of a `bulk_set_margin` call.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOutcome {
    /// The rewrite ran; see the report for what was written and skipped
    Applied(BulkReport),
    /// The target margin is below the confirmation threshold; nothing was written
    NeedsConfirmation {
        /// Margin the rewrite would have applied
        target_margin: f64,
    },
}

impl BulkOutcome {
    /// The report of a rewrite that ran, or `None` if it waits for confirmation.
    #[must_use]
    pub fn into_report(self) -> Option<BulkReport> {
        match self {
            Self::Applied(report) => Some(report),
            Self::NeedsConfirmation { .. } => None,
        }
    }
}

/// Change notifications published after successful writes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PriceEvent {
    /// One pair received a new active price
    PriceUpdated {
        /// Catalog product type
        product_type_id: String,
        /// Variant within the product type
        variant_id: String,
        /// Id of the new active record
        record_id: String,
    },
    /// A bulk rewrite finished
    BulkApplied {
        /// Margin applied
        target_margin: f64,
        /// Number of variants rewritten
        applied: usize,
        /// Number of variants skipped
        skipped: usize,
    },
}

/// What happened to one pair inside a retrying write.
enum WriteOutcome {
    Written {
        record: price_override::Model,
        previous: Option<price_override::Model>,
    },
    Skipped(overrides::SkipReason),
}

/// Pricing API over a repository.
#[derive(Debug)]
pub struct PricingService<R> {
    repository: R,
    catalog: Arc<Catalog>,
    settings: PricingSettings,
    events: broadcast::Sender<PriceEvent>,
}

impl<R: OverrideRepository> PricingService<R> {
    /// Creates a service. Settings are taken as already validated.
    #[must_use]
    pub fn new(repository: R, catalog: Arc<Catalog>, settings: PricingSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            repository,
            catalog,
            settings,
            events,
        }
    }

    /// The reference catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The active pricing settings.
    #[must_use]
    pub const fn settings(&self) -> &PricingSettings {
        &self.settings
    }

    /// The backing repository.
    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// Subscribes to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PriceEvent> {
        self.events.subscribe()
    }

    /// Computes the full cost / sale price / margin triple for a cost and price input,
    /// without storing anything.
    ///
    /// # Errors
    /// Returns a validation error for an invalid cost, sale price or margin.
    pub fn preview(&self, cost_price: f64, price: PriceInput) -> Result<PriceFields> {
        match price {
            PriceInput::SalePrice(sale_price) => {
                PriceFields::from_cost_and_sale_price(cost_price, sale_price)
            }
            PriceInput::Margin(margin) => PriceFields::from_cost_and_margin(cost_price, margin),
            PriceInput::DefaultMargin => {
                PriceFields::from_cost_and_margin(cost_price, self.settings.default_margin)
            }
        }
    }

    /// Classifies a margin against the configured thresholds.
    #[must_use]
    pub fn assess(&self, margin: f64) -> MarginAssessment {
        pricing::assess_margin(margin, &self.settings)
    }

    /// Saves a price for one pair.
    ///
    /// Validation runs before the store is touched. Margins below the confirmation
    /// threshold are only stored when `request.confirmed` is set; otherwise the
    /// computed values come back as `NeedsConfirmation`.
    ///
    /// # Errors
    /// Returns `ProductTypeNotFound`/`VariantNotFound` for unknown pairs, a validation
    /// error for bad numbers, `ConcurrentUpdate` if the write kept losing races past
    /// the retry budget, or a database error.
    #[instrument(skip(self, request), fields(product_type_id = %request.product_type_id, variant_id = %request.variant_id))]
    pub async fn set_price(&self, request: SetPriceRequest) -> Result<SetPriceOutcome> {
        self.catalog
            .resolve(&request.product_type_id, &request.variant_id)?;

        let fields = self.preview(request.cost_price, request.price)?;
        let assessment = self.assess(fields.margin);

        if assessment.requires_confirmation() && !request.confirmed {
            warn!(
                margin = fields.margin,
                "Margin below confirmation threshold; not saved"
            );
            return Ok(SetPriceOutcome::NeedsConfirmation {
                margin: fields.margin,
                unit_price: fields.sale_price,
            });
        }
        if assessment.is_low() {
            warn!(margin = fields.margin, "Saving price with low margin");
        }

        let input = PriceOverrideInput {
            product_type_id: request.product_type_id,
            variant_id: request.variant_id,
            unit_price: fields.sale_price,
            cost_price: fields.cost,
            margin: fields.margin,
            currency: self.settings.currency.clone(),
            updated_by: request.updated_by,
        };

        let (product_type_id, variant_id) =
            (input.product_type_id.clone(), input.variant_id.clone());
        let outcome = self
            .write_with_retry(&product_type_id, &variant_id, |_| {
                Ok(RewriteDecision::Apply(input.clone()))
            })
            .await?;

        let WriteOutcome::Written { record, previous } = outcome else {
            // A plain save never decides to skip
            return Err(Error::Database(sea_orm::DbErr::RecordNotInserted));
        };

        info!(
            record_id = %record.id,
            unit_price = record.unit_price,
            margin = record.margin,
            superseded = previous.as_ref().map(|p| p.id.as_str()),
            "Price saved"
        );
        self.publish(PriceEvent::PriceUpdated {
            product_type_id: record.product_type_id.clone(),
            variant_id: record.variant_id.clone(),
            record_id: record.id.clone(),
        });

        Ok(SetPriceOutcome::Saved {
            record,
            previous,
            assessment,
        })
    }

    /// The current price for a pair, or `None` if it was never priced.
    ///
    /// # Errors
    /// Returns an error if the repository read fails.
    pub async fn get_active_price(
        &self,
        product_type_id: &str,
        variant_id: &str,
    ) -> Result<Option<price_override::Model>> {
        self.repository.active(product_type_id, variant_id).await
    }

    /// Every price ever stored for a pair, newest first.
    ///
    /// # Errors
    /// Returns an error if the repository read fails.
    pub async fn price_history(
        &self,
        product_type_id: &str,
        variant_id: &str,
    ) -> Result<Vec<price_override::Model>> {
        self.repository
            .query_by_pair(product_type_id, variant_id)
            .await
    }

    /// Re-derives sale prices at `target_margin` for every priced variant in scope.
    ///
    /// The margin is validated before anything is written. A margin below the
    /// confirmation threshold writes nothing unless `confirmed` is set and comes back
    /// as `NeedsConfirmation`. Each variant is written independently; unpriced
    /// variants and variants without a usable cost are reported as skipped and do not
    /// stop the batch.
    ///
    /// # Errors
    /// Returns `InvalidMargin` before any write, or the first storage error hit while
    /// writing (variants written before that point stay written).
    #[instrument(skip(self))]
    pub async fn bulk_set_margin(
        &self,
        target_margin: f64,
        scope: &ScopeFilter,
        updated_by: &str,
        confirmed: bool,
    ) -> Result<BulkOutcome> {
        let target_margin = pricing::validate_margin(target_margin)?;
        let assessment = self.assess(target_margin);
        if assessment.requires_confirmation() && !confirmed {
            warn!(
                target_margin,
                "Bulk margin below confirmation threshold; nothing written"
            );
            return Ok(BulkOutcome::NeedsConfirmation { target_margin });
        }
        if assessment.is_low() {
            warn!(target_margin, "Applying low bulk margin");
        }

        let product_types = self.catalog.scope(scope);
        let mut report = BulkReport::new(target_margin);

        for product_type in &product_types {
            for variant in &product_type.variants {
                let outcome = self
                    .write_with_retry(&product_type.id, &variant.id, |active| {
                        overrides::rewrite_decision(active, target_margin, updated_by)
                    })
                    .await?;

                match outcome {
                    WriteOutcome::Written { record, .. } => report.applied.push(record),
                    WriteOutcome::Skipped(reason) => {
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

        info!(
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            "Bulk margin rewrite finished"
        );
        self.publish(PriceEvent::BulkApplied {
            target_margin,
            applied: report.applied.len(),
            skipped: report.skipped.len(),
        });

        Ok(BulkOutcome::Applied(report))
    }

    /// Reads the active record, lets `build` decide what to write, and supersedes it.
    /// On a lost race the whole read-decide-write cycle is repeated, up to
    /// `max_write_retries` extra times.
    async fn write_with_retry<F>(
        &self,
        product_type_id: &str,
        variant_id: &str,
        build: F,
    ) -> Result<WriteOutcome>
    where
        F: Fn(Option<&price_override::Model>) -> Result<RewriteDecision> + Sync,
    {
        let mut attempt = 0;
        loop {
            let previous = self.repository.active(product_type_id, variant_id).await?;

            let input = match build(previous.as_ref())? {
                RewriteDecision::Apply(input) => input,
                RewriteDecision::Skip(reason) => return Ok(WriteOutcome::Skipped(reason)),
            };

            let expected = previous.as_ref().map(|p| p.id.as_str());
            match self.repository.supersede(input, expected).await {
                Ok(record) => return Ok(WriteOutcome::Written { record, previous }),
                Err(Error::ConcurrentUpdate { found, .. })
                    if attempt < self.settings.max_write_retries =>
                {
                    attempt += 1;
                    warn!(
                        product_type_id,
                        variant_id,
                        attempt,
                        found = found.as_deref(),
                        "Active price changed underneath us; retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn publish(&self, event: PriceEvent) {
        // No subscribers is fine
        if self.events.send(event).is_err() {
            debug!("No price event subscribers");
        }
    }
}
