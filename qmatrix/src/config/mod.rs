//! Static keyboard configuration.
//!
//! There are 2 types of configs:
//! 1. [`KeyboardConfig`]: the keymap and its dimensions, consumed by the dispatcher.
//! 2. [`MatrixConfig`]: GPIO assignment and scan timing, consumed by the matrix scanner.
//!
//! Both are built once at startup and validated there, so dimension errors can never show up
//! in the middle of a scan.

mod entry;

use core::fmt;

pub use entry::{KeymapEntry, build_keymap};
use heapless::Vec;
use qmatrix_types::quantum::Keycode;

use crate::keymap::KeyMap;

/// Maximum number of layers, bounded by the 16-bit layer bitmask.
pub const MATRIX_MAX_LAYERS: usize = 16;
/// Maximum number of rows, bounded by the per-column `u32` scan bitmask.
pub const MATRIX_MAX_ROWS: usize = 32;
/// Maximum number of columns.
pub const MATRIX_MAX_COLS: usize = 32;

/// Default tap window of layer-tap keys.
pub const DEFAULT_MOD_TAP_TIMEOUT_MS: u16 = 200;

/// Configuration errors, detected while building the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Number of layers, rows or columns is zero
    MissingDimension,
    TooManyLayers(u32),
    TooManyRows(u8),
    TooManyCols(u8),
    /// The keymap doesn't hold exactly `layers * rows * cols` entries
    KeymapSizeMismatch { expected: usize, actual: usize },
    /// More packed entries than keymap cells
    KeymapOverflow { size: usize, max: usize },
    /// A packed entry addresses a cell outside the keymap
    InvalidKeymapEntry(u32),
    /// The number of GPIOs doesn't match the matrix dimension
    GpioCountMismatch { kind: GpioKind, expected: usize, actual: usize },
}

/// Row or column GPIO list, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioKind {
    Row,
    Col,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingDimension => write!(f, "number of keyboard layers/rows/columns not specified"),
            ConfigError::TooManyLayers(layers) => {
                write!(f, "{} layers requested, at most {} supported", layers, MATRIX_MAX_LAYERS)
            }
            ConfigError::TooManyRows(rows) => write!(f, "{} rows requested, at most {} supported", rows, MATRIX_MAX_ROWS),
            ConfigError::TooManyCols(cols) => write!(f, "{} cols requested, at most {} supported", cols, MATRIX_MAX_COLS),
            ConfigError::KeymapSizeMismatch { expected, actual } => {
                write!(f, "keymap has {} entries, expected {}", actual, expected)
            }
            ConfigError::KeymapOverflow { size, max } => write!(f, "keymap size overflow ({} vs max {})", size, max),
            ConfigError::InvalidKeymapEntry(entry) => write!(f, "invalid keymap entry 0x{:x}", entry),
            ConfigError::GpioCountMismatch { kind, expected, actual } => {
                write!(f, "{:?} GPIO count is {}, expected {}", kind, actual, expected)
            }
        }
    }
}

impl core::error::Error for ConfigError {}

/// Check the keymap dimensions against the supported limits.
pub(crate) fn check_dimensions(layers: u32, rows: u8, cols: u8) -> Result<(), ConfigError> {
    if layers == 0 || rows == 0 || cols == 0 {
        return Err(ConfigError::MissingDimension);
    }
    if layers as usize > MATRIX_MAX_LAYERS {
        return Err(ConfigError::TooManyLayers(layers));
    }
    if rows as usize > MATRIX_MAX_ROWS {
        return Err(ConfigError::TooManyRows(rows));
    }
    if cols as usize > MATRIX_MAX_COLS {
        return Err(ConfigError::TooManyCols(cols));
    }
    Ok(())
}

/// Keymap and its dimensions. Immutable after construction and shareable between devices with
/// the same layout.
#[derive(Debug, Clone, Copy)]
pub struct KeyboardConfig<'a> {
    layers: u32,
    rows: u8,
    cols: u8,
    /// Flattened `layers x rows x cols` keymap, layer-major
    keymap: &'a [Keycode],
    mod_tap_timeout_ms: u16,
}

impl<'a> KeyboardConfig<'a> {
    /// Validate dimensions and keymap size, then build the config.
    pub fn new(
        layers: u32,
        rows: u8,
        cols: u8,
        keymap: &'a [Keycode],
        mod_tap_timeout_ms: u16,
    ) -> Result<Self, ConfigError> {
        check_dimensions(layers, rows, cols)?;
        let expected = layers as usize * rows as usize * cols as usize;
        if keymap.len() != expected {
            return Err(ConfigError::KeymapSizeMismatch {
                expected,
                actual: keymap.len(),
            });
        }
        Ok(Self {
            layers,
            rows,
            cols,
            keymap,
            mod_tap_timeout_ms,
        })
    }

    /// Build a config from a `[layer][row][col]` array.
    pub fn from_layers<const ROW: usize, const COL: usize, const NUM_LAYER: usize>(
        layers: &'a [[[Keycode; COL]; ROW]; NUM_LAYER],
        mod_tap_timeout_ms: u16,
    ) -> Result<Self, ConfigError> {
        if ROW > u8::MAX as usize {
            return Err(ConfigError::TooManyRows(u8::MAX));
        }
        if COL > u8::MAX as usize {
            return Err(ConfigError::TooManyCols(u8::MAX));
        }
        Self::new(
            NUM_LAYER as u32,
            ROW as u8,
            COL as u8,
            layers.as_flattened().as_flattened(),
            mod_tap_timeout_ms,
        )
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn mod_tap_timeout_ms(&self) -> u16 {
        self.mod_tap_timeout_ms
    }

    /// The keymap store of this configuration.
    pub fn keymap(&self) -> KeyMap<'a> {
        KeyMap::new(self.layers, self.rows, self.cols, self.keymap)
    }
}

/// GPIO assignment and scan timing of a matrix, the equivalent of the device-tree node
/// properties of the keypad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixConfig {
    /// `row-gpios`, read while a column is driven
    pub row_gpios: Vec<u32, MATRIX_MAX_ROWS>,
    /// `col-gpios`, driven one at a time
    pub col_gpios: Vec<u32, MATRIX_MAX_COLS>,
    /// `debounce-delay-ms`, 0 disables debouncing
    pub debounce_ms: u16,
    /// `col-scan-delay-us`, settle time after driving a column
    pub col_scan_delay_us: u32,
    /// `poll-interval` in milliseconds
    pub poll_interval_ms: u32,
    /// `gpio-activelow`
    pub active_low: bool,
    /// `drive-inactive-cols`, drive idle columns instead of floating them
    pub drive_inactive_cols: bool,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            row_gpios: Vec::new(),
            col_gpios: Vec::new(),
            debounce_ms: 5,
            col_scan_delay_us: 0,
            poll_interval_ms: 10,
            active_low: false,
            drive_inactive_cols: false,
        }
    }
}

impl MatrixConfig {
    /// The GPIO lists must match the keymap dimensions.
    pub fn validate(&self, keyboard: &KeyboardConfig<'_>) -> Result<(), ConfigError> {
        if self.row_gpios.len() != keyboard.rows() as usize {
            return Err(ConfigError::GpioCountMismatch {
                kind: GpioKind::Row,
                expected: keyboard.rows() as usize,
                actual: self.row_gpios.len(),
            });
        }
        if self.col_gpios.len() != keyboard.cols() as usize {
            return Err(ConfigError::GpioCountMismatch {
                kind: GpioKind::Col,
                expected: keyboard.cols() as usize,
                actual: self.col_gpios.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dimension_validation() {
        let keymap = [0u16; 8];
        assert!(KeyboardConfig::new(2, 2, 2, &keymap, 200).is_ok());
        assert_eq!(
            KeyboardConfig::new(0, 2, 2, &keymap, 200).unwrap_err(),
            ConfigError::MissingDimension
        );
        assert_eq!(
            KeyboardConfig::new(17, 2, 2, &keymap, 200).unwrap_err(),
            ConfigError::TooManyLayers(17)
        );
        assert_eq!(
            KeyboardConfig::new(1, 33, 1, &keymap, 200).unwrap_err(),
            ConfigError::TooManyRows(33)
        );
        assert_eq!(
            KeyboardConfig::new(2, 2, 3, &keymap, 200).unwrap_err(),
            ConfigError::KeymapSizeMismatch { expected: 12, actual: 8 }
        );
    }

    #[test]
    fn test_from_layers() {
        static KEYMAP: [[[Keycode; 3]; 2]; 2] = [[[4, 5, 6], [7, 8, 9]], [[1, 1, 1], [1, 1, 10]]];
        let config = KeyboardConfig::from_layers(&KEYMAP, 150).unwrap();
        assert_eq!(config.layers(), 2);
        assert_eq!(config.rows(), 2);
        assert_eq!(config.cols(), 3);
        assert_eq!(config.mod_tap_timeout_ms(), 150);
        assert_eq!(config.keymap().lookup(1, 1, 2), Ok(10));
    }

    #[test]
    fn test_gpio_count() {
        let keymap = [0u16; 6];
        let keyboard = KeyboardConfig::new(1, 2, 3, &keymap, 200).unwrap();
        let mut matrix = MatrixConfig::default();
        matrix.row_gpios.extend_from_slice(&[1, 2]).unwrap();
        matrix.col_gpios.extend_from_slice(&[3, 4]).unwrap();
        assert_eq!(
            matrix.validate(&keyboard),
            Err(ConfigError::GpioCountMismatch {
                kind: GpioKind::Col,
                expected: 3,
                actual: 2
            })
        );
        matrix.col_gpios.push(5).unwrap();
        assert_eq!(matrix.validate(&keyboard), Ok(()));
    }
}
