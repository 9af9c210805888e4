use crate::context::Context;
use crate::engine::{Outcome, Simplifier};
use crate::tree::{Block, FuncCall, Token};

use super::{check_arity, invalid_argument, Function};

/// Kind of numbers a record accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Component {
    Float,
    Byte,
}

/// Constructor building a block out of positional numeric parameters.
///
/// Each field is a key and an optional default. Fields with a default can
/// be left out, but only at the end.
pub struct Record {
    fields: &'static [(&'static str, Option<&'static str>)],
    component: Component,
}

impl Record {
    /// `Vector2(x, y)`, also registered as `Point`.
    pub fn vector() -> Self {
        Self {
            fields: &[("X", None), ("Y", None)],
            component: Component::Float,
        }
    }

    /// `Rectangle(x, y, width, height)`
    pub fn rectangle() -> Self {
        Self {
            fields: &[("X", None), ("Y", None), ("Width", None), ("Height", None)],
            component: Component::Float,
        }
    }

    /// `Color(r, g, b[, a])`, channels in `0..=255`, alpha defaulting to
    /// opaque.
    pub fn color() -> Self {
        Self {
            fields: &[("R", None), ("G", None), ("B", None), ("A", Some("255"))],
            component: Component::Byte,
        }
    }

    fn required(&self) -> usize {
        self.fields.iter().filter(|(_, d)| d.is_none()).count()
    }

    fn check(&self, token: &Token) -> std::result::Result<(), String> {
        let value = token.value.trim();
        match self.component {
            Component::Float => match value.parse::<f64>() {
                Ok(number) if number.is_finite() => Ok(()),
                _ => Err(format!("`{}` is not a number", token.value)),
            },
            Component::Byte => value
                .parse::<u8>()
                .map(|_| ())
                .map_err(|_| format!("`{}` is not a color channel in 0..=255", token.value)),
        }
    }
}

impl Function for Record {
    fn simplify(&self, call: &FuncCall, sx: &mut Simplifier, ctx: &Context) -> Outcome {
        if !check_arity(sx, call, self.required(), Some(self.fields.len())) {
            return Outcome::error(&call.meta);
        }
        let mut block = Block::new(call.meta.clone());
        for (idx, (key, default)) in self.fields.iter().enumerate() {
            let key = Token::string(*key, call.meta.clone());
            let value = match call.params.get(idx) {
                Some(param) => {
                    let token = match sx.require_token(param, ctx) {
                        Ok(token) => token,
                        Err(outcome) => return outcome,
                    };
                    if let Err(message) = self.check(&token) {
                        return invalid_argument(sx, call, param, message);
                    }
                    token
                }
                None => match default {
                    Some(default) => Token::string(*default, call.meta.clone()),
                    None => return Outcome::error(&call.meta),
                },
            };
            block.insert(key, value.into());
        }
        Outcome::Value(block.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Meta;

    #[test]
    fn color_channels_are_bytes() {
        let color = Record::color();
        let token = |v: &str| Token::string(v, Meta::default());
        assert!(color.check(&token("255")).is_ok());
        assert!(color.check(&token("256")).is_err());
        assert!(color.check(&token("0.5")).is_err());
        assert_eq!(color.required(), 3);
    }

    #[test]
    fn vector_components_are_floats() {
        let vector = Record::vector();
        let token = |v: &str| Token::string(v, Meta::default());
        assert!(vector.check(&token("-1.5")).is_ok());
        assert!(vector.check(&token("inf")).is_err());
        assert!(vector.check(&token("left")).is_err());
        assert_eq!(vector.required(), 2);
    }
}
