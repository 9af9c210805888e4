//! Error types.

use std::io;

pub type Result<T> = core::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// Crate-wide error type.
///
/// Only failures the host has to deal with end up here. Problems found inside
/// content files are collected as [`Diagnostic`]s instead, so that a single
/// bad entry never aborts a load.
///
/// [`Diagnostic`]: crate::lang::Diagnostic
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    IoError(String),

    #[cfg(feature = "yaml")]
    #[error("yaml deserialization error: {0}")]
    YamlDeserError(#[from] serde_yaml::Error),
    #[error("toml deserialization error: {0}")]
    TomlDeserError(#[from] toml::de::Error),

    #[error("unsupported config file format: {0}")]
    UnsupportedConfigFormat(String),
    #[error("content file not found: {0}")]
    FileNotFound(String),
    #[error("content could not be fully resolved yet: {0}")]
    NotReady(String),
    #[error("failed converting content: {0}")]
    ConversionError(String),

    #[error("other error: {0}")]
    Other(String),
}
