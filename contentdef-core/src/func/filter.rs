use std::cell::RefCell;

use fnv::FnvHashMap;

use crate::context::Context;
use crate::engine::{Host, Outcome, Simplifier};
use crate::tree::{Array, FuncCall, Node};

use super::choose::strip_member;
use super::{
    array_items, check_arity, require_tokens, Function, CONDITION_KEY, FLATTEN_OPTION,
};

/// `FilterByCondition(list[, Flatten])` keeps the members of the list whose
/// `Condition` holds according to the host.
///
/// Members without a condition are always kept. The condition key is
/// removed from kept members, `Flatten` works as with `ChooseWeighted`.
///
/// The outcome of every condition is remembered per call so that the host
/// can ask whether refreshing would change the result.
#[derive(Default)]
pub struct FilterByCondition {
    last_states: RefCell<FnvHashMap<String, Vec<bool>>>,
}

/// Condition string of a list member, if it has one.
fn condition_of(node: &Node) -> Option<&Node> {
    node.as_block().and_then(|b| b.get(CONDITION_KEY))
}

impl Function for FilterByCondition {
    fn is_late_resolver(&self) -> bool {
        true
    }

    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome {
        if !check_arity(sx, call, 1, Some(2)) {
            return Outcome::error(&call.meta);
        }
        let items = match array_items(sx, call, &call.params[0], ctx) {
            Ok(items) => items,
            Err(outcome) => return outcome,
        };
        let flatten = match require_tokens(sx, &call.params[1..], ctx) {
            Ok(options) => options.iter().any(|t| t.value == FLATTEN_OPTION),
            Err(outcome) => return outcome,
        };

        let mut states = Vec::new();
        let mut kept = Vec::new();
        for item in &items {
            if let Some(condition) = condition_of(item) {
                let condition = match sx.require_token(condition, ctx) {
                    Ok(condition) => condition,
                    Err(outcome) => return outcome,
                };
                match sx.host().check_condition(&condition.value) {
                    Some(true) => states.push(true),
                    Some(false) => {
                        states.push(false);
                        continue;
                    }
                    None => return Outcome::Pending,
                }
            }
            let member = strip_member(item, CONDITION_KEY, flatten);
            match sx.simplify(&member, ctx).into_items() {
                Some(nodes) => kept.extend(nodes),
                None => return Outcome::Pending,
            }
        }

        self.last_states
            .borrow_mut()
            .insert(call.meta.uid.clone(), states);
        Outcome::Value(Array::new(kept, call.meta.clone()).into())
    }

    fn would_change_from_refresh(&self, call: &FuncCall, host: &dyn Host) -> bool {
        let last_states = self.last_states.borrow();
        let last = match last_states.get(&call.meta.uid) {
            Some(last) => last,
            // never resolved, nothing to change
            None => return false,
        };
        let items = match call.params.first() {
            Some(Node::Array(array)) => &array.items,
            _ => return false,
        };
        let mut current = Vec::with_capacity(last.len());
        for item in items {
            if let Some(condition) = condition_of(item) {
                let state = match condition.as_token() {
                    Some(token) => host.check_condition(&token.value),
                    None => None,
                };
                match state {
                    Some(state) => current.push(state),
                    None => return true,
                }
            }
        }
        current != *last
    }

    fn clear_cache(&self) {
        self.last_states.borrow_mut().clear();
    }
}
