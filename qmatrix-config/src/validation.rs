//! Checks run on a freshly loaded `keyboard.toml`
//!
//! Keymap cells are checked when the keymap is built, see [`KeyboardTomlConfig::build_keymap`].

use qmatrix::config::{MATRIX_MAX_COLS, MATRIX_MAX_LAYERS, MATRIX_MAX_ROWS};

use crate::KeyboardTomlConfig;
use crate::error::{ConfigError, ConfigResult};

/// Validates the entire keyboard configuration
pub fn validate_config(config: &KeyboardTomlConfig) -> ConfigResult<()> {
    validate_layout_section(config)?;
    validate_matrix_section(config)?;
    Ok(())
}

/// Validates the [layout] section
fn validate_layout_section(config: &KeyboardTomlConfig) -> ConfigResult<()> {
    let layout = &config.layout;
    check_range("layout.layers", layout.layers as usize, MATRIX_MAX_LAYERS)?;
    check_range("layout.rows", layout.rows as usize, MATRIX_MAX_ROWS)?;
    check_range("layout.cols", layout.cols as usize, MATRIX_MAX_COLS)?;
    if layout.mod_tap_timeout_ms == 0 {
        return Err(ConfigError::InvalidValue {
            field: "layout.mod_tap_timeout_ms".to_string(),
            value: "0".to_string(),
            expected: "a positive timeout".to_string(),
        });
    }
    Ok(())
}

/// Validates the [matrix] section against the layout dimensions
fn validate_matrix_section(config: &KeyboardTomlConfig) -> ConfigResult<()> {
    let matrix = &config.matrix;
    let layout = &config.layout;

    if matrix.row_gpios.len() != layout.rows as usize {
        return Err(ConfigError::Validation {
            field: "matrix.row_gpios".to_string(),
            message: format!("{} GPIOs for {} rows", matrix.row_gpios.len(), layout.rows),
        });
    }
    if matrix.col_gpios.len() != layout.cols as usize {
        return Err(ConfigError::Validation {
            field: "matrix.col_gpios".to_string(),
            message: format!("{} GPIOs for {} cols", matrix.col_gpios.len(), layout.cols),
        });
    }
    if let Some(gpio) = matrix
        .row_gpios
        .iter()
        .find(|gpio| matrix.col_gpios.contains(gpio))
    {
        return Err(ConfigError::Validation {
            field: "matrix".to_string(),
            message: format!("GPIO {} is used as both row and column", gpio),
        });
    }
    if matrix.poll_interval_ms == 0 {
        return Err(ConfigError::InvalidValue {
            field: "matrix.poll_interval_ms".to_string(),
            value: "0".to_string(),
            expected: "a positive interval".to_string(),
        });
    }
    Ok(())
}

fn check_range(field: &str, value: usize, max: usize) -> ConfigResult<()> {
    if value == 0 || value > max {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            expected: format!("1 to {}", max),
        });
    }
    Ok(())
}
