//! Conversion of simplified content into serde-friendly values.
//!
//! Hosts describe the records they expect as regular serde types and read
//! them straight out of a simplified tree with [`deserialize`]. Conversion
//! goes through `toml::Value`:
//!
//! - unquoted tokens that look like integers, floats or booleans become the
//!   corresponding typed values, everything else becomes a string,
//! - `~` is omitted (dropped from arrays, key left out of tables),
//! - blocks become tables, arrays become arrays.
//!
//! Function calls still present in the tree can't be converted, they have to
//! be resolved first.

use serde::de::DeserializeOwned;
use toml::value::{Table, Value};

use crate::error::{Error, Result};

use super::{Node, Token};

/// Converts a node into a toml value. Returns `None` for null.
pub fn to_toml(node: &Node) -> Result<Option<Value>> {
    let value = match node {
        Node::Token(token) if token.is_null() => return Ok(None),
        Node::Token(token) => token_to_toml(token),
        Node::Array(array) => {
            let mut items = Vec::with_capacity(array.len());
            for item in &array.items {
                if let Some(value) = to_toml(item)? {
                    items.push(value);
                }
            }
            Value::Array(items)
        }
        Node::Block(block) => {
            let mut table = Table::new();
            for (key, value) in block.entries.iter() {
                if let Some(value) = to_toml(value)? {
                    table.insert(key.value.clone(), value);
                }
            }
            Value::Table(table)
        }
        Node::Call(_) | Node::Statement(_) => {
            return Err(Error::NotReady(format!(
                "`{}` at {} is not resolved",
                node.function_name().unwrap_or_default(),
                node.location()
            )))
        }
    };
    Ok(Some(value))
}

fn looks_numeric(value: &str) -> bool {
    let digits = value.trim_start_matches(|c| c == '-' || c == '+');
    digits.starts_with(|c: char| c.is_ascii_digit())
        || (digits.starts_with('.') && digits[1..].starts_with(|c: char| c.is_ascii_digit()))
}

fn token_to_toml(token: &Token) -> Value {
    if token.is_string && !token.quoted {
        let value = token.value.as_str();
        match value {
            "true" => return Value::Boolean(true),
            "false" => return Value::Boolean(false),
            _ => (),
        }
        if looks_numeric(value) {
            if let Ok(int) = value.parse::<i64>() {
                return Value::Integer(int);
            }
            if let Ok(float) = value.parse::<f64>() {
                return Value::Float(float);
            }
        }
    }
    Value::String(token.value.clone())
}

/// Deserializes a simplified node into a host type.
pub fn deserialize<T: DeserializeOwned>(node: &Node) -> Result<T> {
    match to_toml(node)? {
        Some(value) => Ok(value.try_into()?),
        None => Err(Error::ConversionError(format!(
            "can't deserialize null value at {}",
            node.location()
        ))),
    }
}

impl Node {
    /// Shorthand for [`deserialize`].
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        deserialize(self)
    }
}
