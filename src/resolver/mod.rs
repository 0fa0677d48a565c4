use crate::config::Config;
use crate::error::{QuarryError, Result};
use crate::types::Environment;
use std::collections::HashMap;

/// Prefix applied to every index name while running tests
pub const TESTING_PREFIX: &str = "testing_";

/// Maps a searchable type to the index its documents live in.
pub trait IndexResolver: Send + Sync {
    /// `index` is the type's own override, if it declares one.
    fn resolve_index_for_type(&self, type_name: &str, index: Option<&str>) -> Result<String>;
}

/// Resolution from configuration: explicit override, then the per-type
/// table, then the default index.
#[derive(Debug, Clone, Default)]
pub struct ConfigIndexResolver {
    type_indices: HashMap<String, String>,
    default_index: Option<String>,
    environment: Environment,
}

impl ConfigIndexResolver {
    pub fn new(
        type_indices: HashMap<String, String>,
        default_index: Option<String>,
        environment: Environment,
    ) -> Self {
        Self {
            type_indices,
            default_index,
            environment,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.type_indices.clone(),
            config.default_index.clone(),
            config.environment,
        )
    }
}

impl IndexResolver for ConfigIndexResolver {
    fn resolve_index_for_type(&self, type_name: &str, index: Option<&str>) -> Result<String> {
        let resolved = index
            .filter(|index| !index.is_empty())
            .or_else(|| self.type_indices.get(type_name).map(String::as_str))
            .or(self.default_index.as_deref())
            .ok_or_else(|| QuarryError::NoIndexForType(type_name.to_string()))?;

        if self.environment == Environment::Testing {
            return Ok(format!("{TESTING_PREFIX}{resolved}"));
        }
        Ok(resolved.to_string())
    }
}
