use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CarecomplyError, Result};

/// Task-runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Delay before a queued task is picked up, in milliseconds.
    /// Default: 500.
    #[serde(default = "default_pickup_delay_ms")]
    pub pickup_delay_ms: u64,
}

fn default_pickup_delay_ms() -> u64 {
    500
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            pickup_delay_ms: default_pickup_delay_ms(),
        }
    }
}

impl JobsConfig {
    /// Load from a YAML file. Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|e| CarecomplyError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = JobsConfig::load_from(Path::new("/nonexistent/jobs.yml")).unwrap();
        assert_eq!(config.pickup_delay_ms, 500);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: JobsConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.pickup_delay_ms, 500);
    }
}
