use crate::context::Context;
use crate::engine::{Outcome, Simplifier};
use crate::tree::{FuncCall, Node};

use super::{check_arity, Function};

/// `Concatenate(a, b, ...)` joins all parameters into a single token.
pub struct Concatenate;

impl Function for Concatenate {
    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome {
        let mut out = String::new();
        for param in &call.params {
            match sx.require_token(param, ctx) {
                Ok(token) => out.push_str(&token.value),
                Err(outcome) => return outcome,
            }
        }
        Outcome::token(out, &call.meta)
    }
}

/// `Join(separator, items...)` joins tokens with a separator, flattening
/// nested arrays on the way.
pub struct Join;

impl Join {
    /// Collects tokens from `node` into `out`. Anything not resolved yet
    /// aborts the whole join.
    fn collect(
        sx: &mut Simplifier,
        node: &Node,
        ctx: &Context,
        out: &mut Vec<String>,
    ) -> Result<(), Outcome> {
        match node {
            Node::Array(array) => {
                for item in &array.items {
                    Join::collect(sx, item, ctx, out)?;
                }
                Ok(())
            }
            _ => match sx.simplify(node, ctx) {
                Outcome::Value(Node::Array(array)) => {
                    for item in &array.items {
                        Join::collect(sx, item, ctx, out)?;
                    }
                    Ok(())
                }
                Outcome::Splice(items) => {
                    for item in &items {
                        Join::collect(sx, item, ctx, out)?;
                    }
                    Ok(())
                }
                Outcome::Empty => Ok(()),
                Outcome::Value(Node::Token(token)) => {
                    if !token.is_null() {
                        out.push(token.value);
                    }
                    Ok(())
                }
                Outcome::Pending => Err(Outcome::Pending),
                // blocks and calls left in the tree
                Outcome::Value(_) => {
                    let token = sx.require_token(node, ctx)?;
                    out.push(token.value);
                    Ok(())
                }
            },
        }
    }
}

impl Function for Join {
    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome {
        if !check_arity(sx, call, 1, None) {
            return Outcome::error(&call.meta);
        }
        let separator = match sx.require_token(&call.params[0], ctx) {
            Ok(separator) => separator,
            Err(outcome) => return outcome,
        };
        let mut parts = Vec::new();
        for param in &call.params[1..] {
            if let Err(outcome) = Join::collect(sx, param, ctx, &mut parts) {
                return outcome;
            }
        }
        Outcome::token(parts.join(separator.value.as_str()), &call.meta)
    }
}
