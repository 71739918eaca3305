use crate::error::{FilterError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DEPTH: usize = 256;
pub const DEFAULT_IDENTITY_FIELD: &str = "_id";

/// Tunables for [`DocumentFilterCompiler`](super::document::DocumentFilterCompiler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    /// Maximum nesting depth accepted by the compiler.
    pub max_depth: usize,

    /// Store-side name substituted for `Id` / `id` path segments.
    pub identity_field: String,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            identity_field: DEFAULT_IDENTITY_FIELD.to_string(),
        }
    }
}

impl FilterSettings {
    pub fn from_json(input: &str) -> Result<Self> {
        let settings: FilterSettings =
            serde_json::from_str(input).map_err(|e| FilterError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(FilterError::Settings(
                "max_depth must be greater than zero".to_string(),
            ));
        }
        if self.identity_field.is_empty() {
            return Err(FilterError::Settings(
                "identity_field must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
