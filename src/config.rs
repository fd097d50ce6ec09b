use crate::error::{FinancialTableError, Result};
use crate::range::DefaultWindows;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a merged cell holds when its source has no value for the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    #[default]
    #[schemars(description = "Leave the cell empty (serialized as null)")]
    NoData,

    #[schemars(description = "Write 0.0 into the cell")]
    Zero,
}

impl MissingValuePolicy {
    pub fn fill(&self) -> Option<f64> {
        match self {
            MissingValuePolicy::NoData => None,
            MissingValuePolicy::Zero => Some(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineConfig {
    #[schemars(description = "Periods shown by default in annual mode, ending at the latest period")]
    pub annual_default_window: usize,

    #[schemars(description = "Periods shown by default in quarterly mode, ending at the latest period")]
    pub quarterly_default_window: usize,

    pub missing_value: MissingValuePolicy,

    #[schemars(
        description = "Derive a TTM row from the latest four quarters when a statement has no explicit TTM record"
    )]
    pub derive_ttm: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let windows = DefaultWindows::default();
        Self {
            annual_default_window: windows.annual,
            quarterly_default_window: windows.quarterly,
            missing_value: MissingValuePolicy::default(),
            derive_ttm: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        for window in [self.annual_default_window, self.quarterly_default_window] {
            if window == 0 {
                return Err(FinancialTableError::InvalidWindow(window));
            }
        }
        Ok(())
    }

    pub fn default_windows(&self) -> DefaultWindows {
        DefaultWindows {
            annual: self.annual_default_window,
            quarterly: self.quarterly_default_window,
        }
    }
}
