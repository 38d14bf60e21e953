use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Grouping key for every aggregation: one brand of one owner, within a
/// category and its supercategory.
///
/// Records sharing an `EntityKey` and a week are treated as the same
/// observation and are summed/averaged together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub brand_owner: String,
    pub brand: String,
    pub category: String,
    pub supercategory: String,
}

impl EntityKey {
    /// Creates a new entity key.
    ///
    /// # Errors
    /// Returns an error if any component is empty or whitespace only.
    pub fn new(
        brand_owner: impl Into<String>,
        brand: impl Into<String>,
        category: impl Into<String>,
        supercategory: impl Into<String>,
    ) -> Result<Self, EntityKeyError> {
        let key = EntityKey {
            brand_owner: brand_owner.into(),
            brand: brand.into(),
            category: category.into(),
            supercategory: supercategory.into(),
        };
        key.validate()?;
        Ok(key)
    }

    fn validate(&self) -> Result<(), EntityKeyError> {
        let components = [
            ("brand owner", &self.brand_owner),
            ("brand", &self.brand),
            ("category", &self.category),
            ("supercategory", &self.supercategory),
        ];
        for (name, value) in components {
            if value.trim().is_empty() {
                return Err(EntityKeyError::EmptyComponent(name));
            }
        }
        Ok(())
    }

    /// True when this entity belongs to the given (brand, category) pair.
    pub fn matches_brand(&self, brand: &str, category: &str) -> bool {
        self.brand == brand && self.category == category
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.brand_owner, self.brand, self.category, self.supercategory
        )
    }
}

/// Errors that can occur when creating entity keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityKeyError {
    #[error("entity key {0} cannot be empty")]
    EmptyComponent(&'static str),
}
