//! Content definition language.
//!
//! # Overview
//!
//! Content files describe data declaratively using a small set of
//! constructs:
//!
//! ```text
//! // line comment, /* block comment */
//! plain value; "quoted value"; 'also quoted'
//! [ list, of, values ]
//! { Key: value; Other: [1, 2] }
//! Function(param, param)
//! Function(param) { data: "trailing payload" }
//! ~                       // null
//! ```
//!
//! Elements are separated with `;` or `,`. A whole file is read as a list.
//! `&` inside text is replaced with the unique id of the content pack and
//! `\` escapes the character that follows it.
//!
//! Processing happens in two steps. The [`lexer`] turns text into a flat
//! stream of tokens, and the [`parser`] builds a source tree out of it.
//! Neither step fails: problems are collected as [`Diagnostic`]s.

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::{Diagnostic, DiagnosticKind};
pub use lexer::tokenize;
pub use parser::{parse, parse_text};
