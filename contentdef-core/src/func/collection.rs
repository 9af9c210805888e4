use crate::context::Context;
use crate::engine::{Outcome, Simplifier};
use crate::tree::{Array, Block, FuncCall, Node};

use super::{check_arity, invalid_argument, require_tokens, Function};

/// Whether `node` is a call left in the tree for a later pass.
fn is_pending(sx: &Simplifier, node: &Node) -> bool {
    node.function_name()
        .map(|name| sx.is_known_function(name))
        .unwrap_or(false)
}

/// `Combine(a, b, ...)` concatenates arrays or merges blocks.
///
/// All parameters have to be of the same kind, nulls are skipped. Later
/// blocks overwrite keys of earlier ones. Without parameters nothing is
/// produced.
pub struct Combine;

impl Function for Combine {
    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome {
        let mut items: Option<Vec<Node>> = None;
        let mut block: Option<Block> = None;

        for param in &call.params {
            let node = match sx.simplify(param, ctx) {
                Outcome::Value(node) if node.is_null() => continue,
                Outcome::Empty => continue,
                Outcome::Pending => return Outcome::Pending,
                Outcome::Splice(spliced) => Node::Array(Array::new(spliced, param.meta().clone())),
                Outcome::Value(node) => node,
            };
            match node {
                Node::Array(array) if block.is_none() => {
                    items.get_or_insert_with(Vec::new).extend(array.items)
                }
                Node::Block(other) if items.is_none() => {
                    let merged = block.get_or_insert_with(|| Block::new(call.meta.clone()));
                    for (key, value) in other.entries {
                        if merged.insert(key.clone(), value).is_some() {
                            warn!(
                                "{}: `{}` overwrites key `{}`",
                                param.location(),
                                call.function,
                                key.value
                            );
                        }
                    }
                }
                Node::Array(_) | Node::Block(_) => {
                    return invalid_argument(sx, call, param, "can't combine arrays with blocks")
                }
                Node::Call(_) | Node::Statement(_) if is_pending(sx, &node) => {
                    return Outcome::Pending
                }
                Node::Token(_) | Node::Call(_) | Node::Statement(_) => {
                    return invalid_argument(
                        sx,
                        call,
                        param,
                        format!("expected an array or a block, found {}", node.kind_name()),
                    )
                }
            }
        }

        match (items, block) {
            (Some(items), _) => Outcome::Value(Array::new(items, call.meta.clone()).into()),
            (_, Some(block)) => Outcome::Value(block.into()),
            (None, None) => Outcome::Empty,
        }
    }
}

/// `Remove(collection, tokens...)` drops array elements equal to any of
/// the tokens, or block entries with any of the tokens as key.
pub struct Remove;

impl Function for Remove {
    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome {
        if !check_arity(sx, call, 1, None) {
            return Outcome::error(&call.meta);
        }
        let removed = match require_tokens(sx, &call.params[1..], ctx) {
            Ok(removed) => removed,
            Err(outcome) => return outcome,
        };
        let collection = &call.params[0];
        match sx.simplify(collection, ctx) {
            Outcome::Value(Node::Array(mut array)) => {
                let mut kept = Vec::with_capacity(array.len());
                for item in array.items.drain(..) {
                    let matches = match sx.simplify_to_token(&item, ctx, false) {
                        Some(token) => removed.contains(&token),
                        None => false,
                    };
                    if !matches {
                        kept.push(item);
                    }
                }
                array.items = kept;
                Outcome::Value(array.into())
            }
            Outcome::Value(Node::Block(mut block)) => {
                for token in &removed {
                    block.entries.remove(token);
                }
                Outcome::Value(block.into())
            }
            Outcome::Pending => Outcome::Pending,
            Outcome::Value(node) if is_pending(sx, &node) => Outcome::Pending,
            Outcome::Value(node) => invalid_argument(
                sx,
                call,
                collection,
                format!("expected an array or a block, found {}", node.kind_name()),
            ),
            _ => invalid_argument(
                sx,
                call,
                collection,
                "expected an array or a block, found nothing",
            ),
        }
    }
}
