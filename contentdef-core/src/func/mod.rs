//! Function library.
//!
//! Functions are looked up by name in a [`FunctionRegistry`] owned by the
//! engine. The registry comes with the built-in functions listed below and
//! hosts extend it with their own through [`ContentEngine::register`].
//!
//! | name | |
//! |---|---|
//! | `@(path)`, `@@(path)` | asset path relative to the calling file |
//! | `Concatenate(a, b, ...)` | joins tokens into one |
//! | `Join(separator, items...)` | joins tokens and nested arrays |
//! | `Choose(list, options...)` | random member (late) |
//! | `ChooseWeighted(list, options...)` | weighted random member (late) |
//! | `FilterByCondition(list[, Flatten])` | members passing their `Condition` (late) |
//! | `Combine(a, b, ...)` | concatenates arrays or merges blocks |
//! | `Remove(collection, tokens...)` | drops elements or keys |
//! | `Vector2`, `Point`, `Rectangle`, `Color` | record constructors |
//! | `^(name[, default])` | context value |
//!
//! [`ContentEngine::register`]: crate::engine::ContentEngine::register

mod asset;
mod choose;
mod collection;
mod context;
mod filter;
mod record;
mod text;

pub use asset::AssetPath;
pub use choose::{Choose, ChooseWeighted};
pub use collection::{Combine, Remove};
pub use context::GetContext;
pub use filter::FilterByCondition;
pub use record::Record;
pub use text::{Concatenate, Join};

use fnv::FnvHashMap;

use crate::context::Context;
use crate::engine::{Host, Outcome, Simplifier};
use crate::lang::DiagnosticKind;
use crate::tree::{FuncCall, Node, Token};
use crate::util;

pub const ASSET_PATH: &str = "@";
pub const RAW_ASSET_PATH: &str = "@@";
pub const CONCATENATE: &str = "Concatenate";
pub const JOIN: &str = "Join";
pub const CHOOSE: &str = "Choose";
pub const CHOOSE_WEIGHTED: &str = "ChooseWeighted";
pub const FILTER_BY_CONDITION: &str = "FilterByCondition";
pub const COMBINE: &str = "Combine";
pub const REMOVE: &str = "Remove";
pub const VECTOR2: &str = "Vector2";
pub const POINT: &str = "Point";
pub const RECTANGLE: &str = "Rectangle";
pub const COLOR: &str = "Color";
pub const GET_CONTEXT: &str = "^";

/// Block key holding the weight of a `ChooseWeighted` member.
pub const WEIGHT_KEY: &str = "Weight";
/// Block key holding the condition of a `FilterByCondition` member.
pub const CONDITION_KEY: &str = "Condition";
/// Option unwrapping members left with a single entry.
pub const FLATTEN_OPTION: &str = "Flatten";
/// Option selecting the host's static random generator.
pub const STATIC_OPTION: &str = "Static";

/// Named transform operating on the source tree.
pub trait Function {
    /// Late-resolving functions are left in the tree by the structural pass
    /// and only collapse when content is consumed.
    fn is_late_resolver(&self) -> bool {
        false
    }

    /// Computes the result of a call.
    ///
    /// Regular functions get the call with parameters already simplified.
    /// Late-resolving functions get the call as it is in the tree and
    /// simplify whatever they need through `sx`.
    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome;

    /// Whether the result of `call` would differ if it was resolved again
    /// now. Only functions caching state between resolutions can tell.
    fn would_change_from_refresh(&self, _call: &FuncCall, _host: &dyn Host) -> bool {
        false
    }

    /// Drops cached state. Called on every full reload.
    fn clear_cache(&self) {}
}

#[derive(Default)]
pub struct FunctionRegistry {
    functions: FnvHashMap<String, Box<dyn Function>>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding all the built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, function: impl Function + 'static) {
        let name = name.into();
        if self
            .functions
            .insert(name.clone(), Box::new(function))
            .is_some()
        {
            debug!("function `{}` replaced", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Function> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Names of all registered functions, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn clear_caches(&self) {
        for function in self.functions.values() {
            function.clear_cache();
        }
    }
}

pub fn register_builtins(registry: &mut FunctionRegistry) {
    registry.register(ASSET_PATH, AssetPath::normalized());
    registry.register(RAW_ASSET_PATH, AssetPath::raw());
    registry.register(CONCATENATE, Concatenate);
    registry.register(JOIN, Join);
    registry.register(CHOOSE, Choose);
    registry.register(CHOOSE_WEIGHTED, ChooseWeighted);
    registry.register(FILTER_BY_CONDITION, FilterByCondition::default());
    registry.register(COMBINE, Combine);
    registry.register(REMOVE, Remove);
    registry.register(VECTOR2, Record::vector());
    registry.register(POINT, Record::vector());
    registry.register(RECTANGLE, Record::rectangle());
    registry.register(COLOR, Record::color());
    registry.register(GET_CONTEXT, GetContext);
}

/// Checks the number of parameters, reporting a mismatch.
pub fn check_arity(
    sx: &mut Simplifier,
    call: &FuncCall,
    min: usize,
    max: Option<usize>,
) -> bool {
    let found = call.params.len();
    if found >= min && max.map(|max| found <= max).unwrap_or(true) {
        return true;
    }
    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    };
    sx.report(
        &call.meta,
        DiagnosticKind::InvalidArity {
            function: call.function.clone(),
            expected,
            found,
        },
    );
    false
}

/// Reports an invalid argument, returning the error placeholder.
pub fn invalid_argument(
    sx: &mut Simplifier,
    call: &FuncCall,
    node: &Node,
    message: impl Into<String>,
) -> Outcome {
    sx.report(
        node.meta(),
        DiagnosticKind::InvalidArgument {
            function: call.function.clone(),
            message: message.into(),
        },
    );
    Outcome::error(&call.meta)
}

/// Members of an array parameter.
///
/// Members of a literal array are returned as they are, anything else is
/// simplified first and has to produce an array.
pub fn array_items(
    sx: &mut Simplifier,
    call: &FuncCall,
    node: &Node,
    ctx: &Context,
) -> Result<Vec<Node>, Outcome> {
    if let Node::Array(array) = node {
        return Ok(array.items.clone());
    }
    match sx.simplify(node, ctx) {
        Outcome::Value(Node::Array(array)) => Ok(array.items),
        Outcome::Splice(items) => Ok(items),
        Outcome::Pending => Err(Outcome::Pending),
        Outcome::Value(other)
            if other
                .function_name()
                .map(|name| sx.is_known_function(name))
                .unwrap_or(false) =>
        {
            Err(Outcome::Pending)
        }
        Outcome::Value(other) => Err(invalid_argument(
            sx,
            call,
            node,
            format!("expected an array, found {}", other.kind_name()),
        )),
        Outcome::Empty => Err(invalid_argument(
            sx,
            call,
            node,
            "expected an array, found nothing",
        )),
    }
}

/// Simplifies all the given nodes to tokens, stopping at the first failure.
pub fn require_tokens(
    sx: &mut Simplifier,
    nodes: &[Node],
    ctx: &Context,
) -> Result<Vec<Token>, Outcome> {
    let mut tokens = Vec::with_capacity(nodes.len());
    for node in nodes {
        tokens.push(sx.require_token(node, ctx)?);
    }
    Ok(tokens)
}

/// Options accepted by the functions picking random members.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChoiceOptions {
    pub flatten: bool,
    pub is_static: bool,
    pub seed: Option<u64>,
}

impl ChoiceOptions {
    /// Reads options from the parameters following the list.
    pub fn parse(
        sx: &mut Simplifier,
        call: &FuncCall,
        ctx: &Context,
    ) -> Result<ChoiceOptions, Outcome> {
        let mut options = ChoiceOptions::default();
        let rest = call.params.get(1..).unwrap_or(&[]);
        for token in require_tokens(sx, rest, ctx)? {
            match token.value.as_str() {
                FLATTEN_OPTION => options.flatten = true,
                STATIC_OPTION => options.is_static = true,
                seed => {
                    options.seed = Some(match seed.parse::<i64>() {
                        Ok(number) => number as u64,
                        Err(_) => util::stable_hash(seed),
                    })
                }
            }
        }
        // static picks without a seed stay tied to the call's identity
        if options.is_static && options.seed.is_none() {
            options.seed = Some(util::stable_hash(&call.meta.uid));
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = FunctionRegistry::with_builtins();
        for name in &[
            "@", "@@", "Concatenate", "Join", "Choose", "ChooseWeighted",
            "FilterByCondition", "Combine", "Remove", "Vector2", "Point",
            "Rectangle", "Color", "^",
        ] {
            assert!(registry.contains(name), "{}", name);
        }
        assert!(registry.get("Choose").unwrap().is_late_resolver());
        assert!(!registry.get("Concatenate").unwrap().is_late_resolver());
    }

    #[test]
    fn registering_replaces_function() {
        let mut registry = FunctionRegistry::new();
        registry.register("Name", Concatenate);
        registry.register("Name", Choose);
        assert_eq!(registry.names(), vec!["Name"]);
        assert!(registry.get("Name").unwrap().is_late_resolver());
    }
}
