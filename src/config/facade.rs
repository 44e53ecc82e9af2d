//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::PathTreeConfig;
use crate::error::Result;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from defaults, the global file and environment.
    pub fn load() -> Result<PathTreeConfig> {
        MergeService::load(None)
    }

    /// Load configuration with an explicit file layered over the global one.
    pub fn load_with_file(path: &Path) -> Result<PathTreeConfig> {
        MergeService::load(Some(path))
    }
}
