//! Parser logic.
//!
//! Recursive-descent builder turning the token stream into a source tree.
//! Parsing never fails: malformed input is recorded as a [`Diagnostic`] and
//! the offending token is passed through as a leaf (or skipped, inside
//! blocks), so that a single file can report many problems at once.
//
//  Grammar (informal):
//
//      Array         ::= '[' Element* ']'
//      Block         ::= '{' (String ':' Element)* '}'
//      FuncCall      ::= String '(' Element* ')'
//      Statement     ::= FuncCall Element          (trailing data)
//      Element       ::= Token | Array | Block | Statement | FuncCall
//
//  Elements may be separated with `;` or `,`. The whole file is read as if
//  wrapped in `[` ... `]`.

use std::rc::Rc;

use crate::tree::{Array, Block, FuncCall, Location, Meta, Node, Statement, Token};

use super::error::{Diagnostic, DiagnosticKind};
use super::lexer;

/// Tokenizes and parses `text` in one go.
pub fn parse_text(text: &str, file: &str, unique_id: &str) -> (Array, Vec<Diagnostic>) {
    let (tokens, mut diagnostics) = lexer::tokenize(text, file, unique_id);
    let (root, parse_diagnostics) = parse(tokens, file);
    diagnostics.extend(parse_diagnostics);
    (root, diagnostics)
}

/// Parses a token stream produced from `file`. The root is always an array.
pub fn parse(tokens: Vec<Token>, file: &str) -> (Array, Vec<Diagnostic>) {
    let file: Rc<str> = Rc::from(file);
    let root_meta = Meta::new(Location::start_of(file), 0);
    let mut parser = Parser::new(tokens);
    let items = parser.parse_sequence(None, &root_meta, "array");
    (Array::new(items, root_meta), parser.diagnostics)
}

fn is_separator(token: &Token) -> bool {
    token.is_symbol(';') || token.is_symbol(',')
}

/// Tokens that end the element in front of them.
fn is_ender(token: &Token) -> bool {
    is_separator(token) || token.is_symbol(')') || token.is_symbol(']') || token.is_symbol('}')
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_is(&self, symbol: char) -> bool {
        self.peek().map(|t| t.is_symbol(symbol)).unwrap_or(false)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }

    fn report(&mut self, meta: &Meta, kind: DiagnosticKind) {
        self.diagnostics.push(Diagnostic::at(meta, kind));
    }

    /// Parses elements up to the `close` symbol, or to the end of the stream
    /// when `close` is `None`.
    fn parse_sequence(&mut self, close: Option<char>, open: &Meta, what: &str) -> Vec<Node> {
        let mut items = Vec::new();
        loop {
            let token = match self.peek() {
                Some(t) => t,
                None => {
                    if close.is_some() {
                        self.report(open, DiagnosticKind::Unterminated(what.to_string()));
                    }
                    break;
                }
            };
            if let Some(c) = close {
                if token.is_symbol(c) {
                    self.pos += 1;
                    break;
                }
            }
            if is_separator(token) {
                self.pos += 1;
                continue;
            }
            if let Some(node) = self.parse_element() {
                items.push(node);
            }
        }
        items
    }

    fn parse_element(&mut self) -> Option<Node> {
        let token = self.next()?;
        if token.is_string {
            if self.peek_is('(') {
                return Some(self.parse_call(token));
            }
            return Some(Node::Token(token));
        }
        let node = if token.is_symbol('[') {
            self.parse_array(token)
        } else if token.is_symbol('{') {
            self.parse_block(token)
        } else if token.is_null() {
            Node::Token(token)
        } else {
            self.report(
                &token.meta,
                DiagnosticKind::UnexpectedToken(token.value.clone()),
            );
            Node::Token(token)
        };
        Some(node)
    }

    fn parse_array(&mut self, open: Token) -> Node {
        let items = self.parse_sequence(Some(']'), &open.meta, "array");
        Node::Array(Array::new(items, open.meta))
    }

    fn parse_call(&mut self, name: Token) -> Node {
        // opening parenthesis
        self.pos += 1;
        let params = self.parse_sequence(Some(')'), &name.meta, "function call");
        let call = FuncCall::new(name.value, params, name.meta);

        if !self.at_value() {
            return Node::Call(call);
        }
        match self.parse_element() {
            Some(data) => Node::Statement(Statement::new(call, data)),
            None => Node::Call(call),
        }
    }

    /// Whether the next token starts an element.
    fn at_value(&self) -> bool {
        self.peek().map(|t| !is_ender(t)).unwrap_or(false)
    }

    fn parse_block(&mut self, open: Token) -> Node {
        let mut block = Block::new(open.meta.clone());
        loop {
            let token = match self.peek() {
                Some(t) => t,
                None => {
                    self.report(&open.meta, DiagnosticKind::Unterminated("block".to_string()));
                    break;
                }
            };
            if token.is_symbol('}') {
                self.pos += 1;
                break;
            }
            if is_separator(token) {
                self.pos += 1;
                continue;
            }
            if !token.is_string {
                let meta = token.meta.clone();
                let found = token.value.clone();
                self.report(&meta, DiagnosticKind::MissingKey(found));
                self.skip_entry();
                continue;
            }

            let key = match self.next() {
                Some(key) => key,
                None => break,
            };
            if !self.peek_is(':') {
                self.report(&key.meta, DiagnosticKind::MissingSeparator(key.value.clone()));
                self.skip_entry();
                continue;
            }
            self.pos += 1;

            if !self.at_value() {
                self.report(&key.meta, DiagnosticKind::MissingValue(key.value.clone()));
                continue;
            }
            let value = match self.parse_element() {
                Some(value) => value,
                None => continue,
            };
            if block.entries.contains_key(&key) {
                self.report(&key.meta, DiagnosticKind::DuplicateKey(key.value.clone()));
                continue;
            }
            block.insert(key, value);
        }
        Node::Block(block)
    }

    /// Skips tokens up to the end of the current block entry, stepping over
    /// nested brackets. Stray closing brackets are dropped along the way.
    fn skip_entry(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            if depth == 0 && (is_separator(token) || token.is_symbol('}')) {
                break;
            }
            if token.is_symbol('{') || token.is_symbol('[') || token.is_symbol('(') {
                depth += 1;
            } else if token.is_symbol('}') || token.is_symbol(']') || token.is_symbol(')') {
                depth = depth.saturating_sub(1);
            }
            self.pos += 1;
        }
    }
}
