#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use contentdef_core::{ContentEngine, EngineConfig, Host, Node};
use simplelog::{Config, LevelFilter, TestLogger};

/// Host serving content from memory.
///
/// Conditions missing from the table are reported as not ready. The table
/// is shared so that tests can change it while the engine owns the host.
#[derive(Default)]
pub struct MemoryHost {
    files: HashMap<String, String>,
    conditions: Rc<RefCell<HashMap<String, bool>>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, text: &str) -> Self {
        self.files.insert(path.to_string(), text.to_string());
        self
    }

    pub fn conditions(&self) -> Rc<RefCell<HashMap<String, bool>>> {
        self.conditions.clone()
    }
}

impl Host for MemoryHost {
    fn check_condition(&self, condition: &str) -> Option<bool> {
        self.conditions.borrow().get(condition).copied()
    }

    fn normalize_asset_name(&self, path: &str) -> String {
        format!("assets/{}", path.to_lowercase())
    }

    fn load_file_text(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }
}

pub fn seeded_config(seed: u64) -> EngineConfig {
    EngineConfig {
        seed: Some(seed),
        unique_id: "author.pack".to_string(),
        ..EngineConfig::default()
    }
}

pub fn engine(host: MemoryHost) -> ContentEngine {
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
    ContentEngine::new(seeded_config(1), Box::new(host))
}

/// Values of a list of tokens.
pub fn values(nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .map(|n| match n {
            Node::Token(t) => t.value.clone(),
            other => panic!("expected token, found {:?}", other),
        })
        .collect()
}
