//! Content engine.
//!
//! The engine owns the function registry, the host callbacks and the random
//! generator, and drives the two evaluation passes:
//!
//! - [`ContentEngine::load_file`] parses a file and runs the structural
//!   pass, executing `Include`, `If` and `Set^` and collapsing every
//!   regular function call. Late-resolving calls such as `Choose` stay in
//!   the tree.
//! - [`ContentEngine::resolve`] runs the consumption pass on any part of
//!   the loaded tree, collapsing what was left. It can be called any number
//!   of times, each time rolling late calls anew.

pub mod host;
mod simplify;

pub use host::{FsHost, Host};
pub use simplify::{Outcome, Simplifier, CONTROL_CONSTRUCTS, IF, INCLUDE, SET_CONTEXT};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::EngineConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::func::{Function, FunctionRegistry};
use crate::lang::{parser, Diagnostic};
use crate::tree::{Array, FuncCall, Node, Token};
use crate::util;

/// Content file after the structural pass.
#[derive(Debug, Clone)]
pub struct Loaded {
    /// Path relative to the content root
    pub file: String,
    /// Tree as parsed
    pub source: Node,
    /// Tree after the structural pass, always an array
    pub root: Node,
    pub diagnostics: Vec<Diagnostic>,
}

impl Loaded {
    /// Top level elements of the processed file.
    pub fn items(&self) -> &[Node] {
        match &self.root {
            Node::Array(array) => &array.items[..],
            other => std::slice::from_ref(other),
        }
    }
}

pub struct ContentEngine {
    config: EngineConfig,
    host: Box<dyn Host>,
    functions: FunctionRegistry,
    rng: StdRng,
    /// Diagnostics from consumption passes, see `take_diagnostics`
    diagnostics: Vec<Diagnostic>,
}

impl ContentEngine {
    /// Creates a new engine with all the built-in functions registered.
    pub fn new(config: EngineConfig, host: Box<dyn Host>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            host,
            functions: FunctionRegistry::with_builtins(),
            rng,
            diagnostics: Vec::new(),
        }
    }

    /// Creates a new engine reading content from the file system.
    pub fn from_config(config: EngineConfig) -> Self {
        let host = FsHost::new(&config);
        Self::new(config, Box::new(host))
    }

    /// Registers a host function, replacing any function of the same name.
    pub fn register(&mut self, name: impl Into<String>, function: impl Function + 'static) {
        self.functions.register(name, function);
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    /// Parses text without simplifying it.
    pub fn parse(&self, text: &str, file: &str) -> (Array, Vec<Diagnostic>) {
        parser::parse_text(text, file, &self.config.unique_id)
    }

    /// Loads the file at the given path relative to the content root.
    pub fn load_file(&mut self, file: &str) -> Result<Loaded> {
        let file = util::normalize_path(file);
        info!("loading content file: {}", file);
        let text = self
            .host
            .load_file_text(&file)
            .ok_or_else(|| Error::FileNotFound(file.clone()))?;
        Ok(self.load_text(&text, &file))
    }

    /// Loads content from text, `file` being used for locations and for
    /// resolving relative includes.
    ///
    /// This is a full reload: caches kept by functions are cleared.
    pub fn load_text(&mut self, text: &str, file: &str) -> Loaded {
        debug!("clearing function caches");
        self.functions.clear_caches();

        let (root, mut diagnostics) = self.parse(text, file);
        let source = Node::Array(root);
        let root = self.structural_pass(&source, file, &mut diagnostics);
        Loaded {
            file: file.to_string(),
            source,
            root,
            diagnostics,
        }
    }

    /// Runs the structural pass over the parsed tree again, without
    /// reparsing, picking up changes in host state.
    pub fn refresh(&mut self, loaded: &mut Loaded) {
        debug!("refreshing {}", loaded.file);
        let mut diagnostics: Vec<Diagnostic> = loaded
            .diagnostics
            .iter()
            .filter(|d| d.kind.is_parse_error())
            .cloned()
            .collect();
        loaded.root = self.structural_pass(&loaded.source, &loaded.file, &mut diagnostics);
        loaded.diagnostics = diagnostics;
    }

    fn structural_pass(
        &mut self,
        root: &Node,
        file: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Node {
        let mut sx = Simplifier::new(
            &self.functions,
            self.host.as_ref(),
            &self.config,
            &mut self.rng,
            diagnostics,
            false,
        )
        .with_include_root(file);
        match sx.simplify(root, &Context::new()) {
            Outcome::Value(node) => node,
            outcome => outcome
                .into_node(root.meta())
                .unwrap_or_else(|| root.clone()),
        }
    }

    /// Whether refreshing `loaded` would change the output of any
    /// refreshing function in it.
    pub fn would_change_from_refresh(&self, loaded: &Loaded) -> bool {
        self.node_would_change(&loaded.root)
    }

    fn node_would_change(&self, node: &Node) -> bool {
        match node {
            Node::Token(_) => false,
            Node::Call(call) => {
                self.call_would_change(call)
                    || call.params.iter().any(|p| self.node_would_change(p))
            }
            Node::Statement(st) => {
                self.call_would_change(&st.call)
                    || st.call.params.iter().any(|p| self.node_would_change(p))
                    || self.node_would_change(&st.data)
            }
            Node::Block(block) => block.entries.values().any(|v| self.node_would_change(v)),
            Node::Array(array) => array.items.iter().any(|i| self.node_would_change(i)),
        }
    }

    fn call_would_change(&self, call: &FuncCall) -> bool {
        match self.functions.get(&call.function) {
            Some(function) => function.would_change_from_refresh(call, self.host.as_ref()),
            None => false,
        }
    }

    /// Simplifies a node in either mode. Diagnostics end up in the engine,
    /// see [`ContentEngine::take_diagnostics`].
    pub fn simplify(&mut self, node: &Node, allow_late_resolve: bool) -> Outcome {
        let ctx = node.meta().context.clone();
        let mut sx = Simplifier::new(
            &self.functions,
            self.host.as_ref(),
            &self.config,
            &mut self.rng,
            &mut self.diagnostics,
            allow_late_resolve,
        )
        .with_include_root(&node.location().file);
        sx.simplify(node, &ctx)
    }

    /// Runs the consumption pass on a node, returning `None` if it isn't
    /// ready yet. A node producing nothing resolves to null.
    pub fn resolve(&mut self, node: &Node) -> Option<Node> {
        self.simplify(node, true).into_node(node.meta())
    }

    /// Runs the consumption pass on a node that has to end up as a token.
    /// Failures are reported, giving the error placeholder.
    pub fn resolve_token(&mut self, node: &Node) -> Option<Token> {
        let ctx = node.meta().context.clone();
        let mut sx = Simplifier::new(
            &self.functions,
            self.host.as_ref(),
            &self.config,
            &mut self.rng,
            &mut self.diagnostics,
            true,
        )
        .with_include_root(&node.location().file);
        sx.simplify_to_token(node, &ctx, true)
    }

    /// Takes the diagnostics reported by consumption passes so far.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
