use crate::context::Context;
use crate::engine::{Outcome, Simplifier};
use crate::tree::FuncCall;
use crate::util;

use super::check_arity;

/// `@(path)` and `@@(path)`.
///
/// Resolves a path written relative to the calling file. The raw variant
/// (`@@`) gives the file system path, composed against the content root.
/// The normalized variant (`@`) passes the root-relative path through the
/// host's asset name normalizer.
pub struct AssetPath {
    normalize: bool,
}

impl AssetPath {
    pub fn normalized() -> Self {
        Self { normalize: true }
    }

    pub fn raw() -> Self {
        Self { normalize: false }
    }
}

impl super::Function for AssetPath {
    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome {
        if !check_arity(sx, call, 1, Some(1)) {
            return Outcome::error(&call.meta);
        }
        let path = match sx.require_token(&call.params[0], ctx) {
            Ok(path) => path,
            Err(outcome) => return outcome,
        };
        let resolved = util::resolve_path(&call.meta.location.file, &path.value);
        if self.normalize {
            Outcome::token(sx.host().normalize_asset_name(&resolved), &call.meta)
        } else {
            let path = util::compose_root(&sx.config().content_root, &resolved);
            Outcome::token(path, &call.meta)
        }
    }
}
