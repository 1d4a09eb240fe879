//! Common error types for Thanos

use thiserror::Error;

/// Common result type for Thanos operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Thanos services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML config file present but not parseable
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
