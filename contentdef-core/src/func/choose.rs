use rand::distributions::{Distribution, Uniform, WeightedIndex};

use crate::context::Context;
use crate::engine::{Outcome, Simplifier};
use crate::tree::{FuncCall, Node, Token};

use super::{array_items, check_arity, invalid_argument, ChoiceOptions, Function, WEIGHT_KEY};

/// `Choose(list, options...)` picks a random member of the list.
pub struct Choose;

impl Function for Choose {
    fn is_late_resolver(&self) -> bool {
        true
    }

    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome {
        if !check_arity(sx, call, 1, None) {
            return Outcome::error(&call.meta);
        }
        let items = match array_items(sx, call, &call.params[0], ctx) {
            Ok(items) => items,
            Err(outcome) => return outcome,
        };
        let options = match ChoiceOptions::parse(sx, call, ctx) {
            Ok(options) => options,
            Err(outcome) => return outcome,
        };
        if items.is_empty() {
            return invalid_argument(sx, call, &call.params[0], "nothing to choose from");
        }
        let range = Uniform::new(0, items.len());
        let idx = sx.with_rng(options.seed, options.is_static, |rng| range.sample(rng));
        sx.simplify(&items[idx], ctx)
    }
}

/// `ChooseWeighted(list, options...)` picks a random member of the list
/// with probability proportional to its `Weight`.
///
/// Members without a weight weigh 1. The weight key is removed from the
/// picked member, and with the `Flatten` option a member left with a single
/// entry is replaced by that entry's value.
pub struct ChooseWeighted;

impl Function for ChooseWeighted {
    fn is_late_resolver(&self) -> bool {
        true
    }

    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome {
        if !check_arity(sx, call, 1, None) {
            return Outcome::error(&call.meta);
        }
        let items = match array_items(sx, call, &call.params[0], ctx) {
            Ok(items) => items,
            Err(outcome) => return outcome,
        };
        let options = match ChoiceOptions::parse(sx, call, ctx) {
            Ok(options) => options,
            Err(outcome) => return outcome,
        };
        if items.is_empty() {
            return invalid_argument(sx, call, &call.params[0], "nothing to choose from");
        }

        let mut weights = Vec::with_capacity(items.len());
        for item in &items {
            let weight = match item.as_block().and_then(|b| b.get(WEIGHT_KEY)) {
                Some(weight) => match sx.require_token(weight, ctx) {
                    Ok(token) => parse_weight(&token),
                    Err(Outcome::Pending) => return Outcome::Pending,
                    Err(_) => 1.,
                },
                None => 1.,
            };
            weights.push(weight);
        }
        let distribution = match WeightedIndex::new(&weights) {
            Ok(distribution) => distribution,
            Err(e) => {
                return invalid_argument(sx, call, &call.params[0], format!("can't pick: {}", e))
            }
        };
        let idx = sx.with_rng(options.seed, options.is_static, |rng| {
            distribution.sample(rng)
        });
        let picked = strip_member(&items[idx], WEIGHT_KEY, options.flatten);
        sx.simplify(&picked, ctx)
    }
}

fn parse_weight(token: &Token) -> f64 {
    match token.value.trim().parse::<f64>() {
        Ok(weight) if weight.is_finite() && weight >= 0. => weight,
        _ => {
            warn!(
                "{}: invalid weight `{}`, using 1 instead",
                token.meta.location, token.value
            );
            1.
        }
    }
}

/// Removes `key` from a block member. With `flatten`, a block left with a
/// single entry gives that entry's value instead.
pub(super) fn strip_member(node: &Node, key: &str, flatten: bool) -> Node {
    match node {
        Node::Block(block) => {
            let mut block = block.clone();
            block.remove(key);
            if flatten && block.len() == 1 {
                if let Some((_, value)) = block.entries.pop_front() {
                    return value;
                }
            }
            Node::Block(block)
        }
        other => other.clone(),
    }
}
