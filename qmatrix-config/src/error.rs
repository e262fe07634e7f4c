//! Error type of `keyboard.toml` loading and conversion.

use std::fmt;

/// Errors raised while loading, validating or converting `keyboard.toml`
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// File I/O error
    FileRead { path: String, message: String },
    /// TOML parsing or deserialization error
    TomlParse { path: String, message: String },
    /// Validation error with context
    Validation { field: String, message: String },
    /// Invalid value
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
    /// A keymap cell holds an expression that does not parse
    InvalidKeycode {
        layer: usize,
        row: usize,
        col: usize,
        expr: String,
        message: String,
    },
    /// Rejected by the core configuration checks
    Keyboard(qmatrix::config::ConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileRead { path, message } => {
                write!(f, "Failed to read config file '{}': {}", path, message)
            }
            ConfigError::TomlParse { path, message } => {
                write!(f, "Failed to parse '{}': {}", path, message)
            }
            ConfigError::Validation { field, message } => {
                write!(f, "Validation error in '{}': {}", field, message)
            }
            ConfigError::InvalidValue { field, value, expected } => {
                write!(f, "Invalid value '{}' for '{}', expected: {}", value, field, expected)
            }
            ConfigError::InvalidKeycode {
                layer,
                row,
                col,
                expr,
                message,
            } => write!(
                f,
                "Invalid keycode '{}' at layer {}, row {}, col {}: {}",
                expr, layer, row, col, message
            ),
            ConfigError::Keyboard(e) => write!(f, "Invalid keyboard config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<qmatrix::config::ConfigError> for ConfigError {
    fn from(e: qmatrix::config::ConfigError) -> Self {
        ConfigError::Keyboard(e)
    }
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
