//! Application configuration loading from config.toml
//!
//! config.toml holds the reference catalog (`[[product_types]]` with nested
//! `[[product_types.variants]]`) and the optional `[pricing]` table. The catalog is
//! read once at start-up; there is no runtime interface for changing it.

use crate::{
    config::pricing::PricingSettings,
    core::catalog::{Catalog, ProductType},
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Pricing parameters; defaults apply when the table is absent
    #[serde(default)]
    pub pricing: PricingSettings,
    /// Reference catalog
    #[serde(default)]
    pub product_types: Vec<ProductType>,
}

impl AppConfig {
    /// Validates the configuration and splits it into the catalog and pricing settings.
    ///
    /// # Errors
    /// Returns `Error::Config` if the pricing settings are inconsistent or the catalog
    /// has blank or duplicate identifiers.
    pub fn into_parts(self) -> Result<(Catalog, PricingSettings)> {
        self.pricing.validate()?;
        let catalog = Catalog::new(self.product_types)?;
        Ok((catalog, self.pricing))
    }
}

/// Parses configuration from a TOML string.
///
/// # Errors
/// Returns `Error::Config` if the TOML is invalid or required fields are missing.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `PRICEDESK_CONFIG`, or ./config.toml when unset.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn load_default_config() -> Result<AppConfig> {
    let path =
        std::env::var("PRICEDESK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config(path)
}
