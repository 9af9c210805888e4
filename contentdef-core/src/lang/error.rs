use std::fmt;

use crate::tree::{Location, Meta};

/// Recoverable problem found while lexing, parsing or simplifying content.
///
/// Diagnostics never interrupt processing. They are gathered in a list and
/// handed over to the host together with whatever content could be built.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub location: Location,
    /// Number of characters covered, starting at `location`
    pub length: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(location: Location, length: usize, kind: DiagnosticKind) -> Self {
        Self {
            location,
            length,
            kind,
        }
    }

    /// Creates a diagnostic pointing at the node described by `meta`.
    pub fn at(meta: &Meta, kind: DiagnosticKind) -> Self {
        Self::new(meta.location.clone(), meta.length.max(1), kind)
    }

    pub fn kind(&self) -> &DiagnosticKind {
        &self.kind
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    // lexing
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedComment,

    // parsing
    #[error("unexpected `{0}`")]
    UnexpectedToken(String),
    #[error("expected block key, found `{0}`")]
    MissingKey(String),
    #[error("missing `:` after block key `{0}`")]
    MissingSeparator(String),
    #[error("missing value for block key `{0}`")]
    MissingValue(String),
    #[error("duplicate block key `{0}`")]
    DuplicateKey(String),
    #[error("unterminated {0}")]
    Unterminated(String),

    // includes
    #[error("included file not found: {0}")]
    IncludeNotFound(String),
    #[error("include cycle: {}", .0.join(" -> "))]
    IncludeCycle(Vec<String>),
    #[error("include depth limit of {0} exceeded")]
    IncludeDepth(usize),

    // simplification
    #[error("`{function}` expects {expected} parameter(s), found {found}")]
    InvalidArity {
        function: String,
        expected: String,
        found: usize,
    },
    #[error("`{function}`: {message}")]
    InvalidArgument { function: String, message: String },
    #[error("expected a value, found {0}")]
    ExpectedValue(String),
    #[error("unknown function `{name}`{}", .suggestion.as_ref().map(|s| format!(", did you mean `{}`?", s)).unwrap_or_default())]
    UnknownFunction {
        name: String,
        suggestion: Option<String>,
    },
    #[error("invalid context value {0}")]
    InvalidContextValue(String),

    #[error("{0}")]
    Other(String),
}

impl DiagnosticKind {
    /// Whether this diagnostic was raised before any simplification took
    /// place.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::UnterminatedString
                | DiagnosticKind::UnterminatedComment
                | DiagnosticKind::UnexpectedToken(_)
                | DiagnosticKind::MissingKey(_)
                | DiagnosticKind::MissingSeparator(_)
                | DiagnosticKind::MissingValue(_)
                | DiagnosticKind::DuplicateKey(_)
                | DiagnosticKind::Unterminated(_)
        )
    }
}

impl std::error::Error for Diagnostic {}

impl fmt::Display for Diagnostic {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        fmt_err_msg(formatter, &self.location, &self.kind.to_string())
    }
}

fn fmt_err_msg(
    formatter: &mut fmt::Formatter,
    location: &Location,
    message: &str,
) -> fmt::Result {
    let source: &str = if location.file.is_empty() {
        "unknown"
    } else {
        &location.file
    };
    write!(
        formatter,
        "source: {}, line: {}, column: {} - {}",
        source, location.line, location.column, message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn display_includes_position() {
        let diag = Diagnostic::new(
            Location::new(Rc::from("data/a.txt"), 3, 7),
            1,
            DiagnosticKind::MissingSeparator("Name".to_string()),
        );
        assert_eq!(
            diag.to_string(),
            "source: data/a.txt, line: 3, column: 7 - missing `:` after block key `Name`"
        );
    }

    #[test]
    fn unknown_function_suggestion() {
        let kind = DiagnosticKind::UnknownFunction {
            name: "Chose".to_string(),
            suggestion: Some("Choose".to_string()),
        };
        assert_eq!(
            kind.to_string(),
            "unknown function `Chose`, did you mean `Choose`?"
        );
    }
}
