use crate::context::Context;
use crate::engine::{Outcome, Simplifier};
use crate::lang::DiagnosticKind;
use crate::tree::{FuncCall, Token};

use super::{check_arity, Function};

/// `^(name[, default])` reads a value bound with `Set^` or passed to
/// `Include`.
///
/// Bound values are copied into place with the uids marked by the reading
/// call, so that each read has its own identity.
pub struct GetContext;

impl Function for GetContext {
    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome {
        if !check_arity(sx, call, 1, Some(2)) {
            return Outcome::error(&call.meta);
        }
        let name = match sx.require_token(&call.params[0], ctx) {
            Ok(name) => name,
            Err(outcome) => return outcome,
        };
        if let Some(value) = ctx.get(&name) {
            let mut value = value.clone();
            value.prefix_uid(&format!("{}>", call.meta.uid));
            return sx.simplify(&value, ctx);
        }
        if let Some(default) = call.params.get(1) {
            return sx.simplify(default, ctx);
        }
        sx.report(
            &call.meta,
            DiagnosticKind::InvalidContextValue(name.value.clone()),
        );
        Outcome::Value(
            Token::string(
                format!("invalid context value {}", name.value),
                call.meta.clone(),
            )
            .into(),
        )
    }
}
