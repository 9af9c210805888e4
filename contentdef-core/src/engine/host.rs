//! Callbacks the engine needs from the application embedding it.

use std::path::PathBuf;

use linked_hash_map::LinkedHashMap;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::config::EngineConfig;
use crate::util;

/// Application side of the engine.
pub trait Host {
    /// Evaluates a condition written in the host's own condition language.
    /// Returns `None` if the answer isn't available yet.
    fn check_condition(&self, condition: &str) -> Option<bool>;

    /// Canonicalizes an asset path that was already resolved relative to
    /// the content root.
    fn normalize_asset_name(&self, path: &str) -> String {
        path.to_string()
    }

    /// Creates a random generator for the given seed. Static generators
    /// must produce the same sequence for the same seed across reloads and
    /// sessions.
    fn random(&self, seed: u64, is_static: bool) -> Box<dyn RngCore> {
        let _ = is_static;
        Box::new(StdRng::seed_from_u64(seed))
    }

    /// Reads a content file, `path` being relative to the content root.
    fn load_file_text(&self, path: &str) -> Option<String>;
}

/// Host reading content straight from the file system.
///
/// Conditions are answered from a fixed table, unknown conditions are
/// false.
pub struct FsHost {
    content_root: PathBuf,
    asset_prefix: Option<String>,
    conditions: LinkedHashMap<String, bool>,
}

impl FsHost {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            content_root: config.content_root.clone(),
            asset_prefix: config.asset_prefix.clone(),
            conditions: config.conditions.clone(),
        }
    }

    pub fn set_condition(&mut self, condition: impl Into<String>, value: bool) {
        self.conditions.insert(condition.into(), value);
    }
}

impl Host for FsHost {
    fn check_condition(&self, condition: &str) -> Option<bool> {
        match self.conditions.get(condition) {
            Some(value) => Some(*value),
            None => {
                debug!("unknown condition `{}`, assuming false", condition);
                Some(false)
            }
        }
    }

    fn normalize_asset_name(&self, path: &str) -> String {
        match &self.asset_prefix {
            Some(prefix) => util::normalize_path(&format!("{}/{}", prefix, path)),
            None => path.to_string(),
        }
    }

    fn load_file_text(&self, path: &str) -> Option<String> {
        let full_path = self.content_root.join(util::normalize_path(path));
        match util::read_text_file(&full_path) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("failed reading {:?}: {}", full_path, e);
                None
            }
        }
    }
}
