//! This library implements a declarative content-definition language.
//!
//! Content files describe records (`{ Key: value }`), lists (`[a, b]`) and
//! function calls (`Name(param, ...)`) that are reduced to plain values by
//! the [`ContentEngine`]. Evaluation happens in two passes:
//!
//! - the structural pass runs when a file is loaded. It splices in included
//!   files, evaluates conditional sections, tracks context bindings and
//!   collapses every regular function call.
//! - the consumption pass runs whenever the host needs an actual value.
//!   Late-resolving calls, such as random picks or filters depending on
//!   host conditions, are only collapsed here, anew each time.
//!
//! Problems found in content never abort processing. They are collected as
//! [`Diagnostic`]s and a placeholder takes the place of the broken node.
//!
//! # Using the library
//!
//! To use `contentdef-core` in your Rust project add the following to your
//! `Cargo.toml`:
//!
//! ```toml
//! contentdef-core = "0.1.0"
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use contentdef_core::{ContentEngine, EngineConfig};
//!
//! pub fn main() {
//!     let config = EngineConfig::from_path("content.toml".as_ref()).unwrap();
//!     let mut engine = ContentEngine::from_config(config);
//!     let loaded = engine.load_file("main.txt").unwrap();
//!     for item in loaded.items() {
//!         if let Some(value) = engine.resolve(item) {
//!             println!("{}", value);
//!         }
//!     }
//! }
//! ```
//!
//! Hosts embedding the engine implement the [`Host`] trait to answer
//! conditions, provide random generators and read content files, and may
//! extend the language through [`ContentEngine::register`].

#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;

// reexports
pub use config::EngineConfig;
pub use context::Context;
pub use engine::{ContentEngine, FsHost, Host, Loaded, Outcome, Simplifier};
pub use error::{Error, Result};
pub use func::{Function, FunctionRegistry};
pub use lang::{Diagnostic, DiagnosticKind};
pub use tree::{Array, Block, FuncCall, Location, Meta, Node, Statement, Token};

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod func;
pub mod lang;
pub mod tree;
pub mod util;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
