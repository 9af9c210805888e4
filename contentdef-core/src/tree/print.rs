//! Rendering of source trees back into content language text.
//!
//! The default format writes everything on a single line. The alternate
//! format (`{:#}`) spreads blocks and non-trivial arrays over multiple
//! indented lines. Either way the output parses back into an equal tree.

use std::fmt::{self, Display, Formatter, Write};

use crate::lang::lexer::is_structural;

use super::{Array, Block, FuncCall, Node, Statement, Token};

const INDENT: &str = "    ";

/// Whether a content value has to be quoted to survive a round trip.
fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.contains("//")
        || value.contains("/*")
        || value
            .chars()
            .any(|c| is_structural(c) || matches!(c, '"' | '\'' | '\\' | '&'))
}

fn write_token(f: &mut Formatter, token: &Token) -> fmt::Result {
    if !token.is_string {
        return f.write_str(&token.value);
    }
    if !token.quoted && !needs_quotes(&token.value) {
        return f.write_str(&token.value);
    }
    f.write_char('"')?;
    for c in token.value.chars() {
        if matches!(c, '"' | '\\' | '&') {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

fn write_indent(f: &mut Formatter, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str(INDENT)?;
    }
    Ok(())
}

/// Arrays holding only tokens stay on one line even in pretty mode.
fn is_flat(array: &Array) -> bool {
    array.items.iter().all(|i| matches!(i, Node::Token(_)))
}

fn write_call(f: &mut Formatter, call: &FuncCall, depth: usize) -> fmt::Result {
    write_token(f, &Token::key(call.function.as_str()))?;
    f.write_char('(')?;
    for (n, param) in call.params.iter().enumerate() {
        if n > 0 {
            f.write_str(", ")?;
        }
        write_node(f, param, depth)?;
    }
    f.write_char(')')
}

fn write_block(f: &mut Formatter, block: &Block, depth: usize) -> fmt::Result {
    if block.is_empty() {
        return f.write_str("{}");
    }
    if !f.alternate() {
        f.write_str("{ ")?;
        for (n, (key, value)) in block.entries.iter().enumerate() {
            if n > 0 {
                f.write_str("; ")?;
            }
            write_token(f, key)?;
            f.write_str(": ")?;
            write_node(f, value, depth)?;
        }
        return f.write_str(" }");
    }
    f.write_str("{\n")?;
    for (key, value) in block.entries.iter() {
        write_indent(f, depth + 1)?;
        write_token(f, key)?;
        f.write_str(": ")?;
        write_node(f, value, depth + 1)?;
        f.write_str(";\n")?;
    }
    write_indent(f, depth)?;
    f.write_char('}')
}

fn write_array(f: &mut Formatter, array: &Array, depth: usize) -> fmt::Result {
    if !f.alternate() || is_flat(array) {
        f.write_char('[')?;
        for (n, item) in array.items.iter().enumerate() {
            if n > 0 {
                f.write_str(", ")?;
            }
            write_node(f, item, depth)?;
        }
        return f.write_char(']');
    }
    f.write_str("[\n")?;
    for item in &array.items {
        write_indent(f, depth + 1)?;
        write_node(f, item, depth + 1)?;
        f.write_str(",\n")?;
    }
    write_indent(f, depth)?;
    f.write_char(']')
}

fn write_node(f: &mut Formatter, node: &Node, depth: usize) -> fmt::Result {
    match node {
        Node::Token(t) => write_token(f, t),
        Node::Call(c) => write_call(f, c, depth),
        Node::Statement(s) => {
            write_call(f, &s.call, depth)?;
            f.write_char(' ')?;
            write_node(f, &s.data, depth)
        }
        Node::Block(b) => write_block(f, b, depth),
        Node::Array(a) => write_array(f, a, depth),
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_token(f, self)
    }
}

impl Display for FuncCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_call(f, self, 0)
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_call(f, &self.call, 0)?;
        f.write_char(' ')?;
        write_node(f, &self.data, 0)
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_block(f, self, 0)
    }
}

impl Display for Array {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_array(f, self, 0)
    }
}

/// Renders the items of a file root one per line, the way they would be
/// written at the top level of a content file.
pub fn print_root(root: &Array, pretty: bool) -> String {
    let mut out = String::new();
    for item in &root.items {
        if pretty {
            out.push_str(&format!("{:#};\n", item));
        } else {
            out.push_str(&format!("{};\n", item));
        }
    }
    out
}
