//! Source tree model.
//!
//! Parsing a content file produces a tree made of five kinds of nodes:
//! scalar [`Token`]s, function calls ([`FuncCall`]), calls paired with a
//! trailing payload ([`Statement`]), records ([`Block`]) and lists
//! ([`Array`]). Every node carries [`Meta`] with its source location, the
//! evaluation [`Context`] active at its position and a uid string used to
//! correlate cached state across reloads.
//!
//! Structural comparison (`==`) only looks at content, never at metadata.
//! Tokens compare by value and by whether they are content or structural
//! symbols, which lets them serve as block keys.

pub mod convert;
pub mod print;

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use linked_hash_map::LinkedHashMap;

use crate::context::Context;

/// Unquoted symbol standing for an explicit null value.
pub const NULL_SYMBOL: &str = "~";
/// Value of the placeholder token substituted for nodes that failed to
/// simplify.
pub const ERROR_VALUE: &str = "error";

/// Position of a node within its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path of the source file, relative to the content root
    pub file: Rc<str>,
    /// 1-based line number
    pub line: usize,
    /// 1-based column number
    pub column: usize,
}

impl Location {
    pub fn new(file: Rc<str>, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }

    /// Location pointing at the beginning of the given file.
    pub fn start_of(file: Rc<str>) -> Self {
        Self::new(file, 1, 1)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(Rc::from(""), 0, 0)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Metadata attached to every node.
#[derive(Debug, Clone, Default)]
pub struct Meta {
    pub location: Location,
    /// Number of source characters covered by the node's first token
    pub length: usize,
    /// Bindings visible at this node, assigned by the structural pass
    pub context: Context,
    /// Identity derived from file, position and include chain
    pub uid: String,
}

impl Meta {
    pub fn new(location: Location, length: usize) -> Self {
        let uid = location.to_string();
        Self {
            location,
            length,
            context: Context::default(),
            uid,
        }
    }
}

// metadata never takes part in structural comparison
impl PartialEq for Meta {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

/// Leaf value.
///
/// `is_string` separates content tokens (quoted or not) from the
/// single-character structural symbols produced by the lexer.
#[derive(Debug, Clone)]
pub struct Token {
    pub value: String,
    pub is_string: bool,
    /// Whether the content was written between quotes
    pub quoted: bool,
    pub meta: Meta,
}

impl Token {
    pub fn new(value: impl Into<String>, is_string: bool, meta: Meta) -> Self {
        Self {
            value: value.into(),
            is_string,
            quoted: false,
            meta,
        }
    }

    /// Content token.
    pub fn string(value: impl Into<String>, meta: Meta) -> Self {
        Self::new(value, true, meta)
    }

    /// Explicit null literal.
    pub fn null(meta: Meta) -> Self {
        Self::new(NULL_SYMBOL, false, meta)
    }

    /// Placeholder for a node that failed to simplify.
    pub fn error(meta: Meta) -> Self {
        Self::string(ERROR_VALUE, meta)
    }

    /// Content token without location, used for key lookups.
    pub fn key(value: impl Into<String>) -> Self {
        Self::string(value, Meta::default())
    }

    pub fn quoted(mut self, quoted: bool) -> Self {
        self.quoted = quoted;
        self
    }

    pub fn is_null(&self) -> bool {
        !self.is_string && self.value == NULL_SYMBOL
    }

    /// Whether this is the given structural symbol.
    pub fn is_symbol(&self, symbol: char) -> bool {
        if self.is_string {
            return false;
        }
        let mut chars = self.value.chars();
        chars.next() == Some(symbol) && chars.next().is_none()
    }

    /// Case-insensitive comparison with `true`.
    pub fn is_true(&self) -> bool {
        self.is_string && self.value.eq_ignore_ascii_case("true")
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.is_string == other.is_string
    }
}
impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.is_string.hash(state);
    }
}

/// `Name(p1, p2, ...)`
#[derive(Debug, Clone, PartialEq)]
pub struct FuncCall {
    pub function: String,
    pub params: Vec<Node>,
    pub meta: Meta,
}

impl FuncCall {
    pub fn new(function: impl Into<String>, params: Vec<Node>, meta: Meta) -> Self {
        Self {
            function: function.into(),
            params,
            meta,
        }
    }
}

/// `Name(p1, ...) data`
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub call: FuncCall,
    pub data: Box<Node>,
}

impl Statement {
    pub fn new(call: FuncCall, data: Node) -> Self {
        Self {
            call,
            data: Box::new(data),
        }
    }
}

/// Record with unique token keys, declaration order preserved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub entries: LinkedHashMap<Token, Node>,
    pub meta: Meta,
}

impl Block {
    pub fn new(meta: Meta) -> Self {
        Self {
            entries: LinkedHashMap::new(),
            meta,
        }
    }

    /// Looks up the entry stored under the given content key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(&Token::key(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<Node> {
        self.entries.remove(&Token::key(key))
    }

    /// Inserts an entry, returning the previous value under the same key.
    pub fn insert(&mut self, key: Token, value: Node) -> Option<Node> {
        self.entries.insert(key, value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered list of nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Array {
    pub items: Vec<Node>,
    pub meta: Meta,
}

impl Array {
    pub fn new(items: Vec<Node>, meta: Meta) -> Self {
        Self { items, meta }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Any node of the source tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Token(Token),
    Call(FuncCall),
    Statement(Statement),
    Block(Block),
    Array(Array),
}

impl Node {
    pub fn meta(&self) -> &Meta {
        match self {
            Node::Token(t) => &t.meta,
            Node::Call(c) => &c.meta,
            Node::Statement(s) => &s.call.meta,
            Node::Block(b) => &b.meta,
            Node::Array(a) => &a.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut Meta {
        match self {
            Node::Token(t) => &mut t.meta,
            Node::Call(c) => &mut c.meta,
            Node::Statement(s) => &mut s.call.meta,
            Node::Block(b) => &mut b.meta,
            Node::Array(a) => &mut a.meta,
        }
    }

    pub fn location(&self) -> &Location {
        &self.meta().location
    }

    /// Short description used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Token(t) if t.is_null() => "null",
            Node::Token(_) => "value",
            Node::Call(_) => "function call",
            Node::Statement(_) => "statement",
            Node::Block(_) => "block",
            Node::Array(_) => "array",
        }
    }

    /// Name of the called function for calls and statements.
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Node::Call(c) => Some(&c.function),
            Node::Statement(s) => Some(&s.call.function),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Token(t) if t.is_null())
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Node::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Prepends `prefix` to the uid of this node and all of its
    /// descendants. Used to mark nodes with the include chain that
    /// produced them.
    pub fn prefix_uid(&mut self, prefix: &str) {
        let meta = self.meta_mut();
        meta.uid.insert_str(0, prefix);
        match self {
            Node::Token(_) => (),
            Node::Call(c) => c.params.iter_mut().for_each(|p| p.prefix_uid(prefix)),
            Node::Statement(s) => {
                s.call.params.iter_mut().for_each(|p| p.prefix_uid(prefix));
                s.data.prefix_uid(prefix);
            }
            Node::Block(b) => b.entries.iter_mut().for_each(|(_, v)| v.prefix_uid(prefix)),
            Node::Array(a) => a.items.iter_mut().for_each(|i| i.prefix_uid(prefix)),
        }
    }
}

impl From<Token> for Node {
    fn from(t: Token) -> Self {
        Node::Token(t)
    }
}
impl From<Array> for Node {
    fn from(a: Array) -> Self {
        Node::Array(a)
    }
}
impl From<Block> for Node {
    fn from(b: Block) -> Self {
        Node::Block(b)
    }
}
impl From<FuncCall> for Node {
    fn from(c: FuncCall) -> Self {
        Node::Call(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(line: usize, column: usize) -> Meta {
        Meta::new(Location::new(Rc::from("a.txt"), line, column), 1)
    }

    #[test]
    fn tokens_compare_by_value_and_kind() {
        let a = Token::string("x", meta(1, 1));
        let b = Token::string("x", meta(4, 2)).quoted(true);
        let symbol = Token::new("x", false, meta(1, 1));
        assert_eq!(a, b);
        assert_ne!(a, symbol);
        assert!(Token::null(meta(1, 1)).is_null());
        assert!(!Token::string("~", meta(1, 1)).is_null());
    }

    #[test]
    fn block_lookup_ignores_key_location() {
        let mut block = Block::new(meta(1, 1));
        block.insert(
            Token::string("Weight", meta(2, 3)),
            Token::string("2", meta(2, 11)).into(),
        );
        assert!(block.get("Weight").is_some());
        assert!(block.get("weight").is_none());
        assert!(block.remove("Weight").is_some());
        assert!(block.is_empty());
    }

    #[test]
    fn uid_prefix_reaches_descendants() {
        let mut node = Node::Array(Array::new(
            vec![Token::string("a", meta(1, 2)).into()],
            meta(1, 1),
        ));
        node.prefix_uid("main.txt:3:1>");
        assert_eq!(node.meta().uid, "main.txt:3:1>a.txt:1:1");
        let inner = &node.as_array().unwrap().items[0];
        assert_eq!(inner.meta().uid, "main.txt:3:1>a.txt:1:2");

        let mut block = Block::new(meta(2, 1));
        block.insert(Token::string("A", meta(2, 3)), Token::string("1", meta(2, 6)).into());
        let mut node = Node::Block(block);
        node.prefix_uid("x>");
        let value = node.as_block().unwrap().get("A").unwrap();
        assert_eq!(value.meta().uid, "x>a.txt:2:6");
    }
}
