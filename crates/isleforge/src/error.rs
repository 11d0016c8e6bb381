//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias.
//! Errors are reserved for configuration problems detected while assembling a world.
//! Runtime scarcity (no valid spawn point, stale handles) is reported through
//! `bool`/`Option` returns instead.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("spawn definition references unknown template '{name}'")]
    MissingTemplate { name: String },

    #[error("template '{name}' is registered more than once")]
    DuplicateTemplate { name: String },

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
