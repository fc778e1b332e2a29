//! Price derivation - Converts between cost, sale price and gross margin.
//!
//! Margin is gross margin, relative to the sale price: `(sale - cost) / sale * 100`.
//! A 30% margin on a cost of 60000 is therefore a sale price of 85714, not 78000.
//! All functions here are pure and synchronous.

use crate::{
    config::pricing::PricingSettings,
    errors::{Error, Result},
};

/// Highest margin percentage the engine accepts.
pub const MAX_MARGIN: f64 = 99.0;

/// Rejects margins that are not finite or fall outside `[0, 99]`.
///
/// # Errors
/// Returns `Error::InvalidMargin` for out-of-range or non-finite values.
pub fn validate_margin(margin: f64) -> Result<f64> {
    if !margin.is_finite() || !(0.0..=MAX_MARGIN).contains(&margin) {
        return Err(Error::InvalidMargin { margin });
    }
    Ok(margin)
}

/// Rejects negative or non-finite cost prices.
///
/// # Errors
/// Returns `Error::InvalidCost` for negative, NaN or infinite values.
pub fn validate_cost(cost: f64) -> Result<f64> {
    if !cost.is_finite() || cost < 0.0 {
        return Err(Error::InvalidCost { cost });
    }
    Ok(cost)
}

/// Rejects negative or non-finite sale prices.
///
/// # Errors
/// Returns `Error::InvalidPrice` for negative, NaN or infinite values.
pub fn validate_sale_price(price: f64) -> Result<f64> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidPrice { price });
    }
    Ok(price)
}

/// Computes the sale price that yields `margin` percent gross margin on `cost`,
/// rounded to the nearest whole currency unit.
///
/// # Errors
/// Returns `Error::InvalidCost` or `Error::InvalidMargin` before any arithmetic
/// when either input is out of range.
pub fn derive_sale_price(cost: f64, margin: f64) -> Result<f64> {
    let cost = validate_cost(cost)?;
    let margin = validate_margin(margin)?;
    Ok((cost / (1.0 - margin / 100.0)).round())
}

/// Computes the realized gross margin percentage for a sale price and cost.
///
/// Returns 0 when `sale_price` is zero or negative instead of dividing by zero.
#[must_use]
pub fn derive_margin_from_prices(sale_price: f64, cost: f64) -> f64 {
    if sale_price <= 0.0 {
        return 0.0;
    }
    ((sale_price - cost) / sale_price) * 100.0
}

/// Which of the three linked fields on a price editor the user changed last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceEdit {
    /// Cost changed; margin follows
    Cost(f64),
    /// Sale price changed; margin follows
    SalePrice(f64),
    /// Margin changed; sale price follows, cost stays put
    Margin(f64),
}

/// The cost / sale price / margin triple shown on a price editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceFields {
    /// Acquisition cost per unit
    pub cost: f64,
    /// Sale price per unit
    pub sale_price: f64,
    /// Gross margin percentage
    pub margin: f64,
}

impl PriceFields {
    /// Builds a consistent triple from a cost and a margin.
    ///
    /// # Errors
    /// Returns a validation error if the cost or margin is out of range.
    pub fn from_cost_and_margin(cost: f64, margin: f64) -> Result<Self> {
        let sale_price = derive_sale_price(cost, margin)?;
        Ok(Self {
            cost,
            sale_price,
            margin,
        })
    }

    /// Builds a consistent triple from a cost and a sale price.
    ///
    /// # Errors
    /// Returns a validation error if the cost or sale price is out of range.
    pub fn from_cost_and_sale_price(cost: f64, sale_price: f64) -> Result<Self> {
        let cost = validate_cost(cost)?;
        let sale_price = validate_sale_price(sale_price)?;
        Ok(Self {
            cost,
            sale_price,
            margin: derive_margin_from_prices(sale_price, cost),
        })
    }

    /// Applies one edit and recomputes the dependent field.
    ///
    /// Cost and sale price edits recompute the margin. Margin edits recompute the
    /// sale price from the current cost; the cost is never touched by a margin edit.
    ///
    /// # Errors
    /// Returns a validation error for the edited value. `self` is left unchanged.
    pub fn apply(&mut self, edit: PriceEdit) -> Result<()> {
        *self = match edit {
            PriceEdit::Cost(cost) => Self::from_cost_and_sale_price(cost, self.sale_price)?,
            PriceEdit::SalePrice(sale_price) => {
                Self::from_cost_and_sale_price(self.cost, sale_price)?
            }
            PriceEdit::Margin(margin) => Self::from_cost_and_margin(self.cost, margin)?,
        };
        Ok(())
    }
}

/// Result of checking a margin against the low-margin thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginAssessment {
    /// At or above the warning threshold
    Healthy,
    /// Below the warning threshold; surface a non-blocking warning
    Warning,
    /// Below the confirmation threshold; persist only after explicit confirmation
    RequiresConfirmation,
}

impl MarginAssessment {
    /// Whether the caller must confirm before the price is saved.
    #[must_use]
    pub const fn requires_confirmation(self) -> bool {
        matches!(self, Self::RequiresConfirmation)
    }

    /// Whether the caller should be shown a low-margin notice.
    #[must_use]
    pub const fn is_low(self) -> bool {
        !matches!(self, Self::Healthy)
    }
}

/// Classifies a margin against the configured thresholds.
#[must_use]
pub fn assess_margin(margin: f64, settings: &PricingSettings) -> MarginAssessment {
    if margin < settings.confirmation_margin {
        MarginAssessment::RequiresConfirmation
    } else if margin < settings.warning_margin {
        MarginAssessment::Warning
    } else {
        MarginAssessment::Healthy
    }
}
