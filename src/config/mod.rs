//! Configuration
//!
//! Layered settings for the tree policy and logging, composed with the
//! `config` crate: built-in defaults, the global config file, an explicit
//! file, then `PATHTREE__*` environment variables.

mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;

use crate::logging::LoggingConfig;
use crate::types::TreePolicy;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Tree policy settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeConfig {
    /// Compare path components case-sensitively (default: true)
    #[serde(default = "default_true")]
    pub case_sensitive_paths: bool,

    /// Keep siblings in ascending name order (default: true)
    #[serde(default = "default_true")]
    pub sorted: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            case_sensitive_paths: default_true(),
            sorted: default_true(),
        }
    }
}

impl TreeConfig {
    pub fn policy(&self) -> TreePolicy {
        TreePolicy::new(self.case_sensitive_paths, self.sorted)
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathTreeConfig {
    #[serde(default)]
    pub tree: TreeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}
