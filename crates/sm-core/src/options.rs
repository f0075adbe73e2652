//! Search settings and RON profile files

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_DEPTH, DEFAULT_SUFFIX, DEFAULT_TOLERANCE};

/// Settings for one search run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Relative tolerance for volume and each extent
    pub tolerance: f64,
    /// Directory levels below the root to search (root = 0)
    pub max_depth: usize,
    /// Candidate file suffixes, matched ignoring case
    pub suffixes: Vec<String>,
    /// Evaluate candidates on the rayon thread pool
    pub parallel: bool,
    /// Per-shell progress logging in the B-rep loader
    pub verbose_brep: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_depth: DEFAULT_MAX_DEPTH,
            suffixes: vec![DEFAULT_SUFFIX.to_string()],
            parallel: false,
            verbose_brep: false,
        }
    }
}

impl SearchOptions {
    /// Save options as a RON profile
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), OptionsError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| OptionsError::Serialize(e.to_string()))?;
        std::fs::write(path.as_ref(), content).map_err(|e| OptionsError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load options from a RON profile; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| OptionsError::Io(e.to_string()))?;
        ron::from_str(&content).map_err(|e| OptionsError::Deserialize(e.to_string()))
    }
}

/// Profile loading and saving errors
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}
