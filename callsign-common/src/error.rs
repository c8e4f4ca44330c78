//! Error type for configuration loading
//!
//! Store operations have their own [`crate::StoreError`].

use thiserror::Error;

/// Result of loading or validating configuration
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors
#[derive(Error, Debug)]
pub enum Error {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is malformed or a setting is out of range
    #[error("Configuration error: {0}")]
    Config(String),
}
