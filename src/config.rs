//! Static engine configuration.
//!
//! The scope settings narrow what the ingestion sources hand to the engine;
//! the focus-owner set and contribution threshold drive the query facade.

use crate::sales_record::SalesRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_RETAILER_ID: u32 = 1;
pub const DEFAULT_SUPERCATEGORY: &str = "Total Pet";
pub const DEFAULT_FOCUS_OWNER: &str = "POST HOLDINGS INC";
pub const DEFAULT_COMPETITOR_THRESHOLD: f64 = 0.05;

/// Retailer/supercategory scope applied by the ingestion sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordScope {
    pub retailer_id: u32,
    /// Empty means every supercategory is in scope.
    pub supercategories: BTreeSet<String>,
}

impl RecordScope {
    pub fn new(retailer_id: u32, supercategories: impl IntoIterator<Item = String>) -> Self {
        RecordScope {
            retailer_id,
            supercategories: supercategories.into_iter().collect(),
        }
    }

    pub fn admits(&self, retailer_id: u32, supercategory: &str) -> bool {
        retailer_id == self.retailer_id
            && (self.supercategories.is_empty() || self.supercategories.contains(supercategory))
    }

    pub fn admits_record(&self, record: &SalesRecord) -> bool {
        self.admits(record.retailer_id, &record.key.supercategory)
    }
}

impl Default for RecordScope {
    fn default() -> Self {
        RecordScope::new(DEFAULT_RETAILER_ID, [DEFAULT_SUPERCATEGORY.to_string()])
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retailer_id: u32,
    pub supercategories: BTreeSet<String>,
    pub focus_brand_owners: BTreeSet<String>,
    /// Minimum |contribution to category change| for a competitor to be
    /// reported in the performance summary.
    pub competitor_contribution_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            retailer_id: DEFAULT_RETAILER_ID,
            supercategories: BTreeSet::from([DEFAULT_SUPERCATEGORY.to_string()]),
            focus_brand_owners: BTreeSet::from([DEFAULT_FOCUS_OWNER.to_string()]),
            competitor_contribution_threshold: DEFAULT_COMPETITOR_THRESHOLD,
        }
    }
}

impl EngineConfig {
    pub fn with_focus_owners<I, S>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.focus_brand_owners = owners.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.competitor_contribution_threshold = threshold;
        self
    }

    pub fn scope(&self) -> RecordScope {
        RecordScope {
            retailer_id: self.retailer_id,
            supercategories: self.supercategories.clone(),
        }
    }

    pub fn is_focus_owner(&self, brand_owner: &str) -> bool {
        self.focus_brand_owners.contains(brand_owner)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.competitor_contribution_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        Ok(())
    }

    /// Loads configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds configuration from `SALES_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EngineConfig::default();

        if let Some(value) = lookup("SALES_RETAILER_ID") {
            config.retailer_id = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "SALES_RETAILER_ID",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("SALES_SUPERCATEGORIES") {
            config.supercategories = split_list(&value);
        }
        if let Some(value) = lookup("SALES_FOCUS_OWNERS") {
            config.focus_brand_owners = split_list(&value);
        }
        if let Some(value) = lookup("SALES_COMPETITOR_THRESHOLD") {
            config.competitor_contribution_threshold =
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    name: "SALES_COMPETITOR_THRESHOLD",
                    value: value.clone(),
                })?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn split_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
    #[error("competitor contribution threshold must be a non-negative number, got {0}")]
    InvalidThreshold(f64),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.retailer_id, 1);
        assert!(config.supercategories.contains("Total Pet"));
        assert!(config.is_focus_owner("POST HOLDINGS INC"));
        assert_eq!(config.competitor_contribution_threshold, 0.05);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides_defaults() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("SALES_RETAILER_ID", "7"),
            ("SALES_SUPERCATEGORIES", "Total Pet, Grocery ,"),
            ("SALES_FOCUS_OWNERS", "ACME"),
            ("SALES_COMPETITOR_THRESHOLD", "0.1"),
        ]))
        .unwrap();

        assert_eq!(config.retailer_id, 7);
        assert_eq!(config.supercategories.len(), 2);
        assert!(config.supercategories.contains("Grocery"));
        assert!(config.is_focus_owner("ACME"));
        assert!(!config.is_focus_owner("POST HOLDINGS INC"));
        assert_eq!(config.competitor_contribution_threshold, 0.1);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let result = EngineConfig::from_lookup(lookup_from(&[("SALES_RETAILER_ID", "one")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "SALES_RETAILER_ID", .. })
        ));

        let result =
            EngineConfig::from_lookup(lookup_from(&[("SALES_COMPETITOR_THRESHOLD", "-0.5")]));
        assert!(matches!(result, Err(ConfigError::InvalidThreshold(_))));
    }

    #[test]
    fn test_json_missing_fields_take_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"focus_brand_owners": ["ACME"]}"#).unwrap();
        assert_eq!(config.retailer_id, 1);
        assert_eq!(config.competitor_contribution_threshold, 0.05);
        assert!(config.is_focus_owner("ACME"));
    }

    #[test]
    fn test_scope_admits() {
        let scope = EngineConfig::default().scope();
        assert!(scope.admits(1, "Total Pet"));
        assert!(!scope.admits(2, "Total Pet"));
        assert!(!scope.admits(1, "Grocery"));

        let open = RecordScope::new(1, Vec::new());
        assert!(open.admits(1, "Grocery"));
    }
}
