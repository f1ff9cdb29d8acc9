use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_name;
use crate::ConfigError;

/// OSM `shop` values accepted when a store has no brand profile.
pub const DEFAULT_SHOP_TYPES: &[&str] = &["supermarket", "organic", "health_food"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandProfile {
    /// Canonical brand name as it appears in POI `name` tags.
    pub name: String,
    /// Alternative spellings, e.g. `"denn's Biomarkt"`.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// OSM `shop` tag values the brand's stores carry. Empty means the
    /// defaults in [`DEFAULT_SHOP_TYPES`].
    #[serde(default)]
    pub shop_types: Vec<String>,
}

impl BrandProfile {
    /// The canonical name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    #[must_use]
    pub fn effective_shop_types(&self) -> Vec<String> {
        if self.shop_types.is_empty() {
            DEFAULT_SHOP_TYPES.iter().map(|s| (*s).to_string()).collect()
        } else {
            self.shop_types.clone()
        }
    }

    /// `true` when the normalized store name contains the brand name or
    /// one of its aliases.
    #[must_use]
    pub fn matches_store_name(&self, store_name: &str) -> bool {
        let store = normalize_name(store_name);
        self.names()
            .map(normalize_name)
            .any(|name| !name.is_empty() && store.contains(&name))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandProfile>,
}

impl BrandsFile {
    /// First profile, in file order, that matches the store name.
    #[must_use]
    pub fn find(&self, store_name: &str) -> Option<&BrandProfile> {
        self.brands
            .iter()
            .find(|brand| brand.matches_store_name(store_name))
    }
}

/// Load and validate the brand profiles from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let brands_file: BrandsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::BrandsFileParse)?;

    validate_brands(&brands_file)?;

    Ok(brands_file)
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        if brand.aliases.iter().any(|a| a.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has a blank alias",
                brand.name
            )));
        }

        if brand.shop_types.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has a blank shop type",
                brand.name
            )));
        }

        if !seen_names.insert(normalize_name(&brand.name)) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "brands_test.rs"]
mod tests;
