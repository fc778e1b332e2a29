//! Currency conversion - Turns a foreign sourcing price into a local cost price.

use crate::{
    core::pricing::validate_cost,
    errors::{Error, Result},
};

/// Keeps an explicit exchange rate only when it is a positive finite number.
/// Anything else means "use the default rate" and is stored as `None`.
#[must_use]
pub fn explicit_rate(exchange_rate: Option<f64>) -> Option<f64> {
    exchange_rate.filter(|rate| rate.is_finite() && *rate > 0.0)
}

/// Picks the exchange rate to apply: the given rate when it is a positive finite
/// number, otherwise `default_rate`.
#[must_use]
pub fn effective_rate(exchange_rate: Option<f64>, default_rate: f64) -> f64 {
    explicit_rate(exchange_rate).unwrap_or(default_rate)
}

/// Converts a foreign-currency price into local currency.
///
/// No rounding is applied; fractional local costs are kept so downstream margin
/// math stays precise. An unset, zero or negative `exchange_rate` falls back to
/// `default_rate` rather than producing a zero cost.
///
/// # Errors
/// Returns `Error::InvalidCost` for a negative or non-finite foreign price, and
/// `Error::Config` if the fallback rate itself is not positive.
pub fn derive_local_cost(
    foreign_price: f64,
    exchange_rate: Option<f64>,
    default_rate: f64,
) -> Result<f64> {
    let foreign_price = validate_cost(foreign_price)?;
    let rate = effective_rate(exchange_rate, default_rate);
    if !rate.is_finite() || rate <= 0.0 {
        return Err(Error::Config {
            message: format!("default exchange rate must be positive, got {default_rate}"),
        });
    }
    Ok(foreign_price * rate)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::pricing::derive_sale_price;

    #[test]
    fn test_currency_sourced_scenario() {
        let cost = derive_local_cost(57.0, Some(100.0), 150.0).unwrap();
        assert_eq!(cost, 5700.0);
        assert_eq!(derive_sale_price(cost, 25.0).unwrap(), 7600.0);
    }

    #[test]
    fn test_fractional_cost_is_not_rounded() {
        let cost = derive_local_cost(12.5, Some(151.3), 150.0).unwrap();
        assert!((cost - 1891.25).abs() < 1e-9);
    }

    #[test]
    fn test_unset_or_zero_rate_uses_default() {
        assert_eq!(derive_local_cost(10.0, None, 150.0).unwrap(), 1500.0);
        assert_eq!(derive_local_cost(10.0, Some(0.0), 150.0).unwrap(), 1500.0);
        assert_eq!(derive_local_cost(10.0, Some(-3.0), 150.0).unwrap(), 1500.0);
        assert_eq!(derive_local_cost(10.0, Some(f64::NAN), 150.0).unwrap(), 1500.0);
    }

    #[test]
    fn test_explicit_rate_drops_unusable_rates() {
        assert_eq!(explicit_rate(Some(120.0)), Some(120.0));
        assert_eq!(explicit_rate(Some(0.0)), None);
        assert_eq!(explicit_rate(Some(-3.0)), None);
        assert_eq!(explicit_rate(Some(f64::INFINITY)), None);
        assert_eq!(explicit_rate(None), None);
    }

    #[test]
    fn test_negative_foreign_price_rejected() {
        assert!(matches!(
            derive_local_cost(-1.0, Some(100.0), 150.0),
            Err(Error::InvalidCost { .. })
        ));
    }

    #[test]
    fn test_bad_default_rate_rejected() {
        assert!(matches!(
            derive_local_cost(10.0, None, 0.0),
            Err(Error::Config { .. })
        ));
    }
}
