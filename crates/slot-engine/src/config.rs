//! Tunables shared by the resolvers.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Engine configuration. Absent fields take their defaults when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Spacing of candidate slot start times, in minutes.
    pub slot_step_minutes: u32,
    /// Longest inclusive day range `find_available_days` accepts.
    pub max_range_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_step_minutes: 15,
            max_range_days: 366,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.slot_step_minutes == 0 {
            return Err(EngineError::InvalidInput(
                "slot step must be at least one minute".to_string(),
            ));
        }
        if self.max_range_days == 0 {
            return Err(EngineError::InvalidInput(
                "max range must be at least one day".to_string(),
            ));
        }
        Ok(())
    }
}
