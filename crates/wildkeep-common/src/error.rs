//! Error types for Wildkeep.

use thiserror::Error;

/// Top-level error type for Wildkeep operations.
#[derive(Debug, Error)]
pub enum WildkeepError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Scenario description could not be used
    #[error("Scenario error: {0}")]
    Scenario(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML document was malformed
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be written back out
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type alias for Wildkeep operations.
pub type WildkeepResult<T> = Result<T, WildkeepError>;
