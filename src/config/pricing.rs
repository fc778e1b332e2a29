//! Pricing settings loaded from the `[pricing]` table of config.toml.
//!
//! Every value has a default so the table can be omitted entirely. The default margin
//! and the low-margin thresholds live here and nowhere else; callers receive them
//! through [`PricingSettings`] instead of hardcoding fallbacks.

use crate::errors::{Error, Result};
use serde::Deserialize;

/// Margin used when neither the caller nor the item specifies one.
pub const DEFAULT_MARGIN: f64 = 25.0;
/// Margins below this raise a non-blocking warning.
pub const DEFAULT_WARNING_MARGIN: f64 = 15.0;
/// Margins below this must be explicitly confirmed before saving.
pub const DEFAULT_CONFIRMATION_MARGIN: f64 = 10.0;

/// Tunable pricing parameters.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PricingSettings {
    /// Margin percentage applied when none is given
    pub default_margin: f64,
    /// Warn when a resulting margin is below this percentage
    pub warning_margin: f64,
    /// Require confirmation when a resulting margin is below this percentage
    pub confirmation_margin: f64,
    /// Local currency code stamped on override records
    pub currency: String,
    /// Exchange rate used when a sourced item has none (or a non-positive one)
    pub default_exchange_rate: f64,
    /// How many times a price write is retried after losing a concurrent update
    pub max_write_retries: u32,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            default_margin: DEFAULT_MARGIN,
            warning_margin: DEFAULT_WARNING_MARGIN,
            confirmation_margin: DEFAULT_CONFIRMATION_MARGIN,
            currency: "JPY".to_string(),
            default_exchange_rate: 150.0,
            max_write_retries: 3,
        }
    }
}

impl PricingSettings {
    /// Checks that the settings are internally consistent.
    ///
    /// # Errors
    /// Returns `Error::Config` if a margin is outside `[0, 99]`, the confirmation
    /// threshold exceeds the warning threshold, the default exchange rate is not
    /// positive, or the currency code is blank.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("default_margin", self.default_margin),
            ("warning_margin", self.warning_margin),
            ("confirmation_margin", self.confirmation_margin),
        ] {
            if !value.is_finite() || !(0.0..=99.0).contains(&value) {
                return Err(Error::Config {
                    message: format!("pricing.{name} must be between 0 and 99, got {value}"),
                });
            }
        }

        if self.confirmation_margin > self.warning_margin {
            return Err(Error::Config {
                message: format!(
                    "pricing.confirmation_margin ({}) cannot exceed pricing.warning_margin ({})",
                    self.confirmation_margin, self.warning_margin
                ),
            });
        }

        if !self.default_exchange_rate.is_finite() || self.default_exchange_rate <= 0.0 {
            return Err(Error::Config {
                message: format!(
                    "pricing.default_exchange_rate must be positive, got {}",
                    self.default_exchange_rate
                ),
            });
        }

        if self.currency.trim().is_empty() {
            return Err(Error::Config {
                message: "pricing.currency cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = PricingSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.default_margin, 25.0);
        assert_eq!(settings.warning_margin, 15.0);
        assert_eq!(settings.confirmation_margin, 10.0);
    }

    #[test]
    fn test_partial_table_keeps_defaults() {
        let settings: PricingSettings = toml::from_str("default_margin = 30.0").unwrap();
        assert_eq!(settings.default_margin, 30.0);
        assert_eq!(settings.warning_margin, 15.0);
        assert_eq!(settings.max_write_retries, 3);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let settings = PricingSettings {
            warning_margin: 5.0,
            confirmation_margin: 10.0,
            ..PricingSettings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_out_of_range_default_margin_rejected() {
        let settings = PricingSettings {
            default_margin: 100.0,
            ..PricingSettings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_non_positive_default_rate_rejected() {
        let settings = PricingSettings {
            default_exchange_rate: 0.0,
            ..PricingSettings::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config { .. })));
    }
}
