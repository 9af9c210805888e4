//! Evaluation context.
//!
//! A context is the set of variable bindings visible at some position in the
//! source tree. Contexts are never mutated in place: binding a value through
//! `Set^` or overlaying the entries passed to `Include` creates a new context
//! that copies the parent's bindings, so nodes that captured the old context
//! keep seeing exactly what was visible at their position.

use std::fmt;
use std::rc::Rc;

use linked_hash_map::LinkedHashMap;

use crate::tree::{Node, Token};

/// Copy-on-write binding environment.
///
/// Names are tokens, so the null literal `~` and the content `"~"` are
/// distinct names.
#[derive(Clone, Default)]
pub struct Context {
    bindings: Rc<LinkedHashMap<Token, Node>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &Token) -> Option<&Node> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &Token) -> bool {
        self.bindings.contains_key(name)
    }

    /// Creates a new context with `name` bound to `value`, shadowing any
    /// previous binding of the same name.
    pub fn bind(&self, name: Token, value: Node) -> Context {
        self.overlay(std::iter::once((name, value)))
    }

    /// Creates a new context with all the given bindings applied on top of
    /// the current ones.
    pub fn overlay<I>(&self, entries: I) -> Context
    where
        I: IntoIterator<Item = (Token, Node)>,
    {
        let mut bindings = (*self.bindings).clone();
        for (name, value) in entries {
            bindings.insert(name, value);
        }
        Context {
            bindings: Rc::new(bindings),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(|k| k.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether both handles point at the very same set of bindings.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.bindings, &other.bindings)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}
