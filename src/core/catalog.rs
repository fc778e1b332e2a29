//! Catalog reference data - Product types and their sellable variants.
//!
//! The catalog is read from config.toml at start-up and never changes while the
//! process runs. Lookups here are the only way the engine learns which
//! (product type, variant) pairs exist.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A specific sellable configuration, e.g. "NVR 8-channel".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Identifier, unique within its product type
    pub id: String,
    /// Display name
    pub name: String,
    /// Free-form specification lines
    #[serde(default)]
    pub specs: Vec<String>,
    /// Marks the default recommended choice within the product type
    #[serde(default)]
    pub recommended: bool,
}

/// A category of sellable equipment, e.g. "NVR systems".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    /// Identifier, unique within the catalog
    pub id: String,
    /// Display name
    pub name: String,
    /// Owning service category (e.g., "surveillance", "access-control")
    pub service_category: String,
    /// Variants offered under this type
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl ProductType {
    /// Finds a variant by identifier.
    #[must_use]
    pub fn variant(&self, variant_id: &str) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// The variant flagged as recommended, if any.
    #[must_use]
    pub fn recommended_variant(&self) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.recommended)
    }
}

/// Which part of the catalog a bulk operation covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeFilter {
    /// Every product type
    All,
    /// Product types owned by one service category
    ServiceCategory(String),
    /// A single product type
    ProductType(String),
}

/// Immutable set of product types with unique identifiers.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    product_types: Vec<ProductType>,
}

impl Catalog {
    /// Builds a catalog, rejecting blank or duplicate identifiers.
    ///
    /// # Errors
    /// Returns `Error::Config` if a product type id repeats, a variant id repeats
    /// within its product type, or any identifier is blank.
    pub fn new(product_types: Vec<ProductType>) -> Result<Self> {
        let mut type_ids = HashSet::new();
        for product_type in &product_types {
            if product_type.id.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("product type '{}' has an empty id", product_type.name),
                });
            }
            if !type_ids.insert(product_type.id.as_str()) {
                return Err(Error::Config {
                    message: format!("duplicate product type id '{}'", product_type.id),
                });
            }

            let mut variant_ids = HashSet::new();
            for variant in &product_type.variants {
                if variant.id.trim().is_empty() {
                    return Err(Error::Config {
                        message: format!(
                            "variant '{}' of product type '{}' has an empty id",
                            variant.name, product_type.id
                        ),
                    });
                }
                if !variant_ids.insert(variant.id.as_str()) {
                    return Err(Error::Config {
                        message: format!(
                            "duplicate variant id '{}' in product type '{}'",
                            variant.id, product_type.id
                        ),
                    });
                }
            }
        }

        Ok(Self { product_types })
    }

    /// All product types in configuration order.
    #[must_use]
    pub fn product_types(&self) -> &[ProductType] {
        &self.product_types
    }

    /// Finds a product type by identifier.
    #[must_use]
    pub fn product_type(&self, id: &str) -> Option<&ProductType> {
        self.product_types.iter().find(|pt| pt.id == id)
    }

    /// Resolves a (product type, variant) pair, failing if either part is unknown.
    ///
    /// # Errors
    /// Returns `Error::ProductTypeNotFound` or `Error::VariantNotFound`.
    pub fn resolve(
        &self,
        product_type_id: &str,
        variant_id: &str,
    ) -> Result<(&ProductType, &ProductVariant)> {
        let product_type =
            self.product_type(product_type_id)
                .ok_or_else(|| Error::ProductTypeNotFound {
                    id: product_type_id.to_string(),
                })?;
        let variant = product_type
            .variant(variant_id)
            .ok_or_else(|| Error::VariantNotFound {
                product_type_id: product_type_id.to_string(),
                variant_id: variant_id.to_string(),
            })?;
        Ok((product_type, variant))
    }

    /// Product types selected by a scope filter.
    ///
    /// A filter naming an unknown product type selects nothing; an unknown service
    /// category likewise yields an empty scope.
    #[must_use]
    pub fn scope(&self, filter: &ScopeFilter) -> Vec<ProductType> {
        self.product_types
            .iter()
            .filter(|pt| match filter {
                ScopeFilter::All => true,
                ScopeFilter::ServiceCategory(category) => pt.service_category == *category,
                ScopeFilter::ProductType(id) => pt.id == *id,
            })
            .cloned()
            .collect()
    }

    /// Distinct service categories in configuration order.
    #[must_use]
    pub fn service_categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.product_types
            .iter()
            .map(|pt| pt.service_category.as_str())
            .filter(|category| seen.insert(*category))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::sample_catalog;

    #[test]
    fn test_resolve_known_pair() {
        let catalog = sample_catalog();
        let (pt, v) = catalog.resolve("nvr", "nvr-8ch").unwrap();
        assert_eq!(pt.name, "NVR systems");
        assert_eq!(v.name, "NVR 8-channel");
    }

    #[test]
    fn test_resolve_unknown_pair() {
        let catalog = sample_catalog();
        assert!(matches!(
            catalog.resolve("fax", "fax-1"),
            Err(Error::ProductTypeNotFound { .. })
        ));
        assert!(matches!(
            catalog.resolve("nvr", "nvr-64ch"),
            Err(Error::VariantNotFound { .. })
        ));
    }

    #[test]
    fn test_scope_filters() {
        let catalog = sample_catalog();
        assert_eq!(catalog.scope(&ScopeFilter::All).len(), 3);
        assert_eq!(
            catalog
                .scope(&ScopeFilter::ServiceCategory("surveillance".to_string()))
                .len(),
            2
        );
        let single = catalog.scope(&ScopeFilter::ProductType("card-reader".to_string()));
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].id, "card-reader");
        assert!(
            catalog
                .scope(&ScopeFilter::ProductType("missing".to_string()))
                .is_empty()
        );
    }

    #[test]
    fn test_recommended_variant() {
        let catalog = sample_catalog();
        let nvr = catalog.product_type("nvr").unwrap();
        assert_eq!(nvr.recommended_variant().unwrap().id, "nvr-8ch");
    }

    #[test]
    fn test_service_categories_are_distinct() {
        let catalog = sample_catalog();
        assert_eq!(
            catalog.service_categories(),
            vec!["surveillance", "access-control"]
        );
    }

    #[test]
    fn test_duplicate_variant_rejected() {
        let variant = ProductVariant {
            id: "v1".to_string(),
            name: "V1".to_string(),
            specs: Vec::new(),
            recommended: false,
        };
        let product_type = ProductType {
            id: "t".to_string(),
            name: "T".to_string(),
            service_category: "c".to_string(),
            variants: vec![variant.clone(), variant],
        };
        assert!(matches!(
            Catalog::new(vec![product_type]),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_duplicate_product_type_rejected() {
        let product_type = ProductType {
            id: "t".to_string(),
            name: "T".to_string(),
            service_category: "c".to_string(),
            variants: Vec::new(),
        };
        assert!(matches!(
            Catalog::new(vec![product_type.clone(), product_type]),
            Err(Error::Config { .. })
        ));
    }
}
