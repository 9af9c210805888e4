//! Tree walk reducing nodes to their values.
//!
//! The same walk serves both evaluation modes. With late resolution off
//! (structural pass) control constructs are executed, regular functions are
//! collapsed into their results and late-resolving calls are kept in place
//! with processed parameters. With late resolution on (consumption pass)
//! the remaining calls collapse as well.

use rand::rngs::StdRng;
use rand::RngCore;

use crate::config::EngineConfig;
use crate::context::Context;
use crate::func::FunctionRegistry;
use crate::lang::{parser, Diagnostic, DiagnosticKind};
use crate::tree::{Array, Block, FuncCall, Meta, Node, Statement, Token};
use crate::util;

use super::host::Host;

/// Splices another content file in place of the call.
pub const INCLUDE: &str = "Include";
/// Keeps its data only when the condition holds.
pub const IF: &str = "If";
/// Binds a context value for the rest of the enclosing sequence.
pub const SET_CONTEXT: &str = "Set^";

/// Constructs handled by the simplifier itself rather than the registry.
pub const CONTROL_CONSTRUCTS: &[&str] = &[INCLUDE, IF, SET_CONTEXT];

/// Result of simplifying a single node.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Value(Node),
    /// Nothing was produced, e.g. by `Set^` or an `If` with a false
    /// condition
    Empty,
    /// Multiple nodes taking the place of one, e.g. an included file
    Splice(Vec<Node>),
    /// Depends on something that can't be resolved yet, try again later
    Pending,
}

impl Outcome {
    /// Placeholder value for a node that failed to simplify.
    pub fn error(meta: &Meta) -> Self {
        Outcome::Value(Token::error(meta.clone()).into())
    }

    pub fn token(value: impl Into<String>, meta: &Meta) -> Self {
        Outcome::Value(Token::string(value, meta.clone()).into())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Outcome::Pending)
    }

    /// Turns the outcome into a single node. Nothing becomes a null token
    /// and spliced nodes are wrapped in an array, both using `meta`.
    pub fn into_node(self, meta: &Meta) -> Option<Node> {
        match self {
            Outcome::Value(node) => Some(node),
            Outcome::Empty => Some(Token::null(meta.clone()).into()),
            Outcome::Splice(items) => Some(Array::new(items, meta.clone()).into()),
            Outcome::Pending => None,
        }
    }

    /// Nodes to be placed in an enclosing sequence.
    pub fn into_items(self) -> Option<Vec<Node>> {
        match self {
            Outcome::Value(node) => Some(vec![node]),
            Outcome::Empty => Some(Vec::new()),
            Outcome::Splice(items) => Some(items),
            Outcome::Pending => None,
        }
    }

    pub fn from_items(mut items: Vec<Node>) -> Self {
        match items.len() {
            0 => Outcome::Empty,
            1 => Outcome::Value(items.remove(0)),
            _ => Outcome::Splice(items),
        }
    }
}

/// Single evaluation run over a tree.
///
/// Functions receive the simplifier so that they can simplify their own
/// parameters, report diagnostics and draw random numbers.
pub struct Simplifier<'e> {
    functions: &'e FunctionRegistry,
    host: &'e dyn Host,
    config: &'e EngineConfig,
    rng: &'e mut StdRng,
    diagnostics: &'e mut Vec<Diagnostic>,
    /// Files currently being processed, outermost first
    include_stack: Vec<String>,
    allow_late_resolve: bool,
}

impl<'e> Simplifier<'e> {
    pub fn new(
        functions: &'e FunctionRegistry,
        host: &'e dyn Host,
        config: &'e EngineConfig,
        rng: &'e mut StdRng,
        diagnostics: &'e mut Vec<Diagnostic>,
        allow_late_resolve: bool,
    ) -> Self {
        Self {
            functions,
            host,
            config,
            rng,
            diagnostics,
            include_stack: Vec::new(),
            allow_late_resolve,
        }
    }

    /// Marks `file` as the file the walk starts in, so that including it
    /// again is caught as a cycle.
    pub fn with_include_root(mut self, file: &str) -> Self {
        self.include_stack.push(util::normalize_path(file));
        self
    }

    pub fn allow_late_resolve(&self) -> bool {
        self.allow_late_resolve
    }

    pub fn host(&self) -> &'e dyn Host {
        self.host
    }

    pub fn config(&self) -> &'e EngineConfig {
        self.config
    }

    pub fn report(&mut self, meta: &Meta, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic::at(meta, kind));
    }

    /// Whether `name` is a registered function or a control construct.
    pub fn is_known_function(&self, name: &str) -> bool {
        CONTROL_CONSTRUCTS.contains(&name) || self.functions.contains(name)
    }

    /// Simplifies a node within the given context.
    ///
    /// During the consumption pass nodes annotated by the structural pass
    /// use the context they captured.
    pub fn simplify(&mut self, node: &Node, ctx: &Context) -> Outcome {
        if self.allow_late_resolve && !node.meta().context.is_empty() {
            let own = node.meta().context.clone();
            return self.simplify_in(node, &own);
        }
        self.simplify_in(node, ctx)
    }

    fn simplify_in(&mut self, node: &Node, ctx: &Context) -> Outcome {
        match node {
            Node::Token(token) => {
                let mut token = token.clone();
                token.meta.context = ctx.clone();
                Outcome::Value(token.into())
            }
            Node::Array(array) => match self.simplify_items(&array.items, ctx) {
                Some(items) => {
                    let mut meta = array.meta.clone();
                    meta.context = ctx.clone();
                    Outcome::Value(Array::new(items, meta).into())
                }
                None => Outcome::Pending,
            },
            Node::Block(block) => self.simplify_block(block, ctx),
            Node::Call(call) => self.simplify_call(call, None, ctx),
            Node::Statement(st) => self.simplify_call(&st.call, Some(&*st.data), ctx),
        }
    }

    fn simplify_block(&mut self, block: &Block, ctx: &Context) -> Outcome {
        let mut meta = block.meta.clone();
        meta.context = ctx.clone();
        let mut out = Block::new(meta);
        for (key, value) in block.entries.iter() {
            let value = match self.simplify(value, ctx) {
                Outcome::Value(node) => node,
                Outcome::Empty => continue,
                Outcome::Splice(items) => Array::new(items, value.meta().clone()).into(),
                Outcome::Pending if !self.allow_late_resolve => self.kept(value, ctx),
                Outcome::Pending => return Outcome::Pending,
            };
            out.insert(key.clone(), value);
        }
        Outcome::Value(out.into())
    }

    /// Simplifies a sequence of sibling nodes.
    ///
    /// Bindings made with `Set^` apply to everything after them in the
    /// sequence. Trailing data of calls that don't take any is read as the
    /// next sibling. Returns `None` if any of the items is pending during
    /// consumption.
    pub fn simplify_items(&mut self, items: &[Node], ctx: &Context) -> Option<Vec<Node>> {
        let mut ctx = ctx.clone();
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let mut next = Some(item);
            while let Some(node) = next.take() {
                let outcome = match node {
                    Node::Call(call) if call.function == SET_CONTEXT => {
                        ctx = self.bind_context(call, &ctx);
                        Outcome::Empty
                    }
                    Node::Statement(st) if st.call.function == SET_CONTEXT => {
                        ctx = self.bind_context(&st.call, &ctx);
                        next = Some(&*st.data);
                        Outcome::Empty
                    }
                    Node::Statement(st) if self.takes_no_data(&st.call.function) => {
                        if st.call.function != INCLUDE {
                            warn!(
                                "{}: data after `{}` is read as the next element",
                                st.call.meta.location, st.call.function
                            );
                        }
                        next = Some(&*st.data);
                        let outcome = self.simplify_call(&st.call, None, &ctx);
                        self.or_kept(outcome, &Node::Call(st.call.clone()), &ctx)
                    }
                    other => {
                        let outcome = self.simplify(other, &ctx);
                        self.or_kept(outcome, other, &ctx)
                    }
                };
                out.extend(outcome.into_items()?);
            }
        }
        Some(out)
    }

    /// During the structural pass a pending node stays in the tree as it
    /// is, so that its siblings are still processed.
    fn or_kept(&self, outcome: Outcome, node: &Node, ctx: &Context) -> Outcome {
        match outcome {
            Outcome::Pending if !self.allow_late_resolve => Outcome::Value(self.kept(node, ctx)),
            outcome => outcome,
        }
    }

    fn kept(&self, node: &Node, ctx: &Context) -> Node {
        debug!("{}: not ready, kept for consumption", node.location());
        let mut node = node.clone();
        node.meta_mut().context = ctx.clone();
        node
    }

    /// Simplifies the parameters of a call, keeping the call itself.
    /// Parameters that produce nothing become null.
    pub fn simplify_params(&mut self, call: &FuncCall, ctx: &Context) -> Option<FuncCall> {
        let mut params = Vec::with_capacity(call.params.len());
        for param in &call.params {
            params.push(self.simplify(param, ctx).into_node(param.meta())?);
        }
        let mut meta = call.meta.clone();
        meta.context = ctx.clone();
        Some(FuncCall::new(call.function.clone(), params, meta))
    }

    /// Simplifies a node that has to end up as a single token.
    ///
    /// On failure a diagnostic is recorded and `Err` carries the
    /// placeholder to return in place of the caller's result. A node that
    /// is not ready yields `Err(Outcome::Pending)` without a diagnostic.
    pub fn require_token(&mut self, node: &Node, ctx: &Context) -> Result<Token, Outcome> {
        let found = match self.simplify(node, ctx) {
            Outcome::Value(Node::Token(token)) => return Ok(token),
            Outcome::Pending => return Err(Outcome::Pending),
            Outcome::Value(other) => other,
            Outcome::Empty => {
                self.report(node.meta(), DiagnosticKind::ExpectedValue("nothing".to_string()));
                return Err(Outcome::error(node.meta()));
            }
            Outcome::Splice(_) => {
                self.report(node.meta(), DiagnosticKind::ExpectedValue("array".to_string()));
                return Err(Outcome::error(node.meta()));
            }
        };
        match found.function_name() {
            // kept by the structural pass, resolves later
            Some(name) if self.is_known_function(name) => Err(Outcome::Pending),
            Some(name) => {
                let functions = self.functions;
                let mut names = functions.names();
                names.extend_from_slice(CONTROL_CONSTRUCTS);
                let kind = DiagnosticKind::UnknownFunction {
                    name: name.to_string(),
                    suggestion: util::get_similar(name, &names),
                };
                self.report(node.meta(), kind);
                Err(Outcome::error(node.meta()))
            }
            None => {
                self.report(
                    node.meta(),
                    DiagnosticKind::ExpectedValue(found.kind_name().to_string()),
                );
                Err(Outcome::error(node.meta()))
            }
        }
    }

    /// Simplifies a node to a token.
    ///
    /// With `require` set, failures are reported and the error placeholder
    /// token is returned. Otherwise failures silently give `None`. Nodes
    /// that are not ready yet always give `None`.
    pub fn simplify_to_token(
        &mut self,
        node: &Node,
        ctx: &Context,
        require: bool,
    ) -> Option<Token> {
        if !require {
            return match self.simplify(node, ctx) {
                Outcome::Value(Node::Token(token)) => Some(token),
                _ => None,
            };
        }
        match self.require_token(node, ctx) {
            Ok(token) => Some(token),
            Err(Outcome::Value(Node::Token(placeholder))) => Some(placeholder),
            Err(_) => None,
        }
    }

    /// Runs `f` with a random number generator.
    ///
    /// Without a seed the engine's own generator is used. Otherwise the
    /// host provides a generator for the seed, optionally its static
    /// variant that stays stable across reloads.
    pub fn with_rng<T>(
        &mut self,
        seed: Option<u64>,
        is_static: bool,
        f: impl FnOnce(&mut dyn RngCore) -> T,
    ) -> T {
        match seed {
            None if !is_static => f(&mut *self.rng),
            seed => {
                let mut rng = self.host.random(seed.unwrap_or_default(), is_static);
                f(rng.as_mut())
            }
        }
    }

    fn takes_no_data(&self, function: &str) -> bool {
        function == INCLUDE || self.functions.contains(function)
    }

    fn simplify_call(&mut self, call: &FuncCall, data: Option<&Node>, ctx: &Context) -> Outcome {
        match call.function.as_str() {
            INCLUDE => {
                let outcome = self.include(call, ctx);
                self.with_trailing(outcome, data, ctx)
            }
            IF => self.conditional(call, data, ctx),
            SET_CONTEXT => {
                let ctx = self.bind_context(call, ctx);
                match data {
                    Some(data) => self.simplify(data, &ctx),
                    None => Outcome::Empty,
                }
            }
            _ => self.call_function(call, data, ctx),
        }
    }

    fn call_function(&mut self, call: &FuncCall, data: Option<&Node>, ctx: &Context) -> Outcome {
        let functions = self.functions;
        let function = match functions.get(&call.function) {
            Some(function) => function,
            None => {
                debug!(
                    "{}: leaving unknown function `{}` untouched",
                    call.meta.location, call.function
                );
                return self.keep_call(call, data, ctx);
            }
        };

        let outcome = if function.is_late_resolver() {
            if self.allow_late_resolve {
                function.simplify(call, self, ctx)
            } else {
                trace!(
                    "{}: deferring late call `{}`",
                    call.meta.location,
                    call.function
                );
                match self.simplify_params(call, ctx) {
                    Some(processed) => Outcome::Value(processed.into()),
                    None => Outcome::Pending,
                }
            }
        } else {
            match self.simplify_params(call, ctx) {
                Some(processed) => match function.simplify(&processed, self, ctx) {
                    Outcome::Pending if !self.allow_late_resolve => {
                        trace!(
                            "{}: `{}` is waiting on late calls",
                            call.meta.location,
                            call.function
                        );
                        Outcome::Value(processed.into())
                    }
                    outcome => outcome,
                },
                None => Outcome::Pending,
            }
        };

        if data.is_some() {
            warn!(
                "{}: data after `{}` is read as the next element",
                call.meta.location, call.function
            );
        }
        self.with_trailing(outcome, data, ctx)
    }

    /// Keeps a call in the tree with its parameters and data processed.
    fn keep_call(&mut self, call: &FuncCall, data: Option<&Node>, ctx: &Context) -> Outcome {
        let processed = match self.simplify_params(call, ctx) {
            Some(processed) => processed,
            None => return Outcome::Pending,
        };
        let data = match data {
            Some(data) => data,
            None => return Outcome::Value(processed.into()),
        };
        match self.simplify(data, ctx).into_node(data.meta()) {
            Some(data) => Outcome::Value(Node::Statement(Statement::new(processed, data))),
            None => Outcome::Pending,
        }
    }

    /// Places the outcome of trailing data right after `outcome`.
    fn with_trailing(&mut self, outcome: Outcome, data: Option<&Node>, ctx: &Context) -> Outcome {
        let data = match data {
            Some(data) => data,
            None => return outcome,
        };
        let trailing = self.simplify(data, ctx);
        match (outcome.into_items(), trailing.into_items()) {
            (Some(mut items), Some(rest)) => {
                items.extend(rest);
                Outcome::from_items(items)
            }
            _ => Outcome::Pending,
        }
    }

    fn include(&mut self, call: &FuncCall, ctx: &Context) -> Outcome {
        let found = call.params.len();
        if found == 0 || found > 2 {
            self.report(
                &call.meta,
                DiagnosticKind::InvalidArity {
                    function: INCLUDE.to_string(),
                    expected: "1 or 2".to_string(),
                    found,
                },
            );
            return Outcome::Value(Token::null(call.meta.clone()).into());
        }
        let path = match self.require_token(&call.params[0], ctx) {
            Ok(path) => path,
            Err(Outcome::Pending) if !self.allow_late_resolve => {
                trace!("{}: path not ready, keeping `{}`", call.meta.location, INCLUDE);
                return self.keep_call(call, None, ctx);
            }
            Err(outcome) => return outcome,
        };
        let overrides: Vec<(Token, Node)> = match call.params.get(1) {
            None => Vec::new(),
            Some(param) => match self.simplify(param, ctx) {
                Outcome::Value(Node::Block(block)) => block.entries.into_iter().collect(),
                Outcome::Value(node) if node.is_null() => Vec::new(),
                Outcome::Pending if !self.allow_late_resolve => {
                    return self.keep_call(call, None, ctx)
                }
                Outcome::Pending => return Outcome::Pending,
                other => {
                    let found = match other {
                        Outcome::Value(node) => node.kind_name(),
                        Outcome::Empty => "nothing",
                        _ => "array",
                    };
                    self.report(
                        param.meta(),
                        DiagnosticKind::InvalidArgument {
                            function: INCLUDE.to_string(),
                            message: format!("context overrides must be a block, found {}", found),
                        },
                    );
                    return Outcome::error(&call.meta);
                }
            },
        };

        let file = util::resolve_path(&call.meta.location.file, &path.value);
        if self.include_stack.contains(&file) {
            let mut chain = self.include_stack.clone();
            chain.push(file);
            self.report(&call.meta, DiagnosticKind::IncludeCycle(chain));
            return Outcome::Value(Token::null(call.meta.clone()).into());
        }
        if self.include_stack.len() > self.config.max_include_depth {
            self.report(
                &call.meta,
                DiagnosticKind::IncludeDepth(self.config.max_include_depth),
            );
            return Outcome::Value(Token::null(call.meta.clone()).into());
        }
        let text = match self.host.load_file_text(&file) {
            Some(text) => text,
            None => {
                self.report(&call.meta, DiagnosticKind::IncludeNotFound(file));
                return Outcome::Value(Token::null(call.meta.clone()).into());
            }
        };

        trace!("{}: including {}", call.meta.location, file);
        let (mut root, parse_diagnostics) =
            parser::parse_text(&text, &file, &self.config.unique_id);
        self.diagnostics.extend(parse_diagnostics);
        let prefix = format!("{}>", call.meta.uid);
        for item in root.items.iter_mut() {
            item.prefix_uid(&prefix);
        }

        let ctx = ctx.overlay(overrides);
        self.include_stack.push(file);
        let items = self.simplify_items(&root.items, &ctx);
        self.include_stack.pop();

        match items {
            None => Outcome::Pending,
            Some(mut items) => {
                if items.len() == 1 {
                    match items.remove(0) {
                        Node::Array(array) => Outcome::Splice(array.items),
                        single => Outcome::Value(single),
                    }
                } else {
                    Outcome::from_items(items)
                }
            }
        }
    }

    fn conditional(&mut self, call: &FuncCall, data: Option<&Node>, ctx: &Context) -> Outcome {
        if call.params.len() != 1 {
            self.report(
                &call.meta,
                DiagnosticKind::InvalidArity {
                    function: IF.to_string(),
                    expected: "1".to_string(),
                    found: call.params.len(),
                },
            );
            return Outcome::error(&call.meta);
        }
        let condition = match self.require_token(&call.params[0], ctx) {
            Ok(condition) => condition,
            Err(Outcome::Pending) if !self.allow_late_resolve => {
                trace!(
                    "{}: condition not ready, keeping `{}`",
                    call.meta.location,
                    IF
                );
                return self.keep_call(call, data, ctx);
            }
            Err(outcome) => return outcome,
        };
        if !condition.is_true() {
            return Outcome::Empty;
        }
        match data {
            Some(data) => self.simplify(data, ctx),
            None => {
                self.report(
                    &call.meta,
                    DiagnosticKind::InvalidArgument {
                        function: IF.to_string(),
                        message: "missing data after the condition".to_string(),
                    },
                );
                Outcome::Empty
            }
        }
    }

    /// Returns the context extended with the binding made by a `Set^` call.
    fn bind_context(&mut self, call: &FuncCall, ctx: &Context) -> Context {
        if call.params.len() != 2 {
            self.report(
                &call.meta,
                DiagnosticKind::InvalidArity {
                    function: SET_CONTEXT.to_string(),
                    expected: "2".to_string(),
                    found: call.params.len(),
                },
            );
            return ctx.clone();
        }
        let key = match self.require_token(&call.params[0], ctx) {
            Ok(key) => key,
            Err(Outcome::Pending) => {
                self.report(
                    call.params[0].meta(),
                    DiagnosticKind::InvalidArgument {
                        function: SET_CONTEXT.to_string(),
                        message: "name can't depend on late-resolving functions".to_string(),
                    },
                );
                return ctx.clone();
            }
            Err(_) => return ctx.clone(),
        };
        let value = match self
            .simplify(&call.params[1], ctx)
            .into_node(call.params[1].meta())
        {
            Some(value) => value,
            None => return ctx.clone(),
        };
        trace!(
            "{}: binding context value `{}`",
            call.meta.location,
            key.value
        );
        ctx.bind(key, value)
    }
}
