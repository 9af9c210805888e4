//! Engine configuration.

use std::path::{Path, PathBuf};

use linked_hash_map::LinkedHashMap;

use crate::error::Result;
use crate::util;

pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// Settings shared by the engine and the hosts driving it.
///
/// Every field has a default, so an empty config file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory all content paths are relative to
    pub content_root: PathBuf,
    /// Substituted for `&` when tokenizing
    pub unique_id: String,
    /// Seed for the engine's own random generator, entropy if missing
    pub seed: Option<u64>,
    /// Maximum nesting of `Include` calls
    pub max_include_depth: usize,
    /// Prefix the file system host puts in front of normalized asset names
    pub asset_prefix: Option<String>,
    /// Fixed answers to condition checks, used by the file system host
    pub conditions: LinkedHashMap<String, bool>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("."),
            unique_id: String::new(),
            seed: None,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            asset_prefix: None,
            conditions: LinkedHashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Reads config from a toml (or yaml) file. A relative `content_root`
    /// is taken relative to the directory of the config file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut config: EngineConfig = util::deser_struct_from_path(path)?;
        if config.content_root.is_relative() {
            if let Some(dir) = path.parent() {
                config.content_root = dir.join(&config.content_root);
            }
        }
        debug!(
            "loaded engine config from {:?}, content root: {:?}",
            path, config.content_root
        );
        Ok(config)
    }

    /// Builds a file system path for a path relative to the content root.
    pub fn content_path(&self, relative: &str) -> PathBuf {
        self.content_root.join(util::normalize_path(relative))
    }
}
