use std::path::Path;

use config::{Config, File, FileFormat};
use qmatrix::{KeyboardConfig, MatrixConfig};
use qmatrix_types::quantum::Keycode;
use serde_derive::Deserialize;
use serde_inline_default::serde_inline_default;

pub mod defaults;
pub mod error;
pub mod layout;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use layout::parse_keycode;

/// Configurations for a matrix keyboard, the content of `keyboard.toml`
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyboardTomlConfig {
    /// Basic information of the keyboard
    #[serde(default)]
    pub keyboard: KeyboardInfo,
    /// GPIOs and scan timing of the matrix
    pub matrix: MatrixTomlConfig,
    /// Dimensions and keymap
    pub layout: LayoutConfig,
}

/// Basic information of the keyboard
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyboardInfo {
    /// Keyboard name
    #[serde_inline_default(defaults::KEYBOARD_NAME.to_string())]
    pub name: String,
}

impl Default for KeyboardInfo {
    fn default() -> Self {
        Self {
            name: defaults::KEYBOARD_NAME.to_string(),
        }
    }
}

/// `[matrix]` section, mirroring the keypad device-tree properties
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixTomlConfig {
    pub row_gpios: Vec<u32>,
    pub col_gpios: Vec<u32>,
    #[serde_inline_default(defaults::DEBOUNCE_MS)]
    pub debounce_ms: u16,
    #[serde_inline_default(defaults::COL_SCAN_DELAY_US)]
    pub col_scan_delay_us: u32,
    #[serde_inline_default(defaults::POLL_INTERVAL_MS)]
    pub poll_interval_ms: u32,
    #[serde(default = "default_false")]
    pub active_low: bool,
    #[serde(default = "default_false")]
    pub drive_inactive_cols: bool,
}

/// `[layout]` section
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    pub layers: u32,
    pub rows: u8,
    pub cols: u8,
    /// Layer-tap timeout
    #[serde_inline_default(defaults::MOD_TAP_TIMEOUT_MS)]
    pub mod_tap_timeout_ms: u16,
    /// Layers of rows of keycode expressions
    pub keymap: Vec<Vec<Vec<String>>>,
}

impl KeyboardTomlConfig {
    /// Load `keyboard.toml` from a file.
    pub fn new_from_toml_path<P: AsRef<Path>>(config_toml_path: P) -> ConfigResult<Self> {
        let path = config_toml_path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::load(&content, &path.display().to_string())
    }

    /// Load `keyboard.toml` content held in memory.
    pub fn new_from_toml_str(content: &str) -> ConfigResult<Self> {
        Self::load(content, "<string>")
    }

    fn load(content: &str, origin: &str) -> ConfigResult<Self> {
        // Catch TOML syntax errors with their position before handing over to `config`
        toml::from_str::<toml::Table>(content).map_err(|e| ConfigError::TomlParse {
            path: origin.to_string(),
            message: e.message().to_string(),
        })?;

        let config: Self = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ConfigError::TomlParse {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Matrix configuration of the core driver.
    pub fn matrix_config(&self) -> ConfigResult<MatrixConfig> {
        let matrix = &self.matrix;
        let mut config = MatrixConfig {
            debounce_ms: matrix.debounce_ms,
            col_scan_delay_us: matrix.col_scan_delay_us,
            poll_interval_ms: matrix.poll_interval_ms,
            active_low: matrix.active_low,
            drive_inactive_cols: matrix.drive_inactive_cols,
            ..Default::default()
        };
        for &gpio in &matrix.row_gpios {
            config
                .row_gpios
                .push(gpio)
                .map_err(|_| qmatrix::config::ConfigError::TooManyRows(matrix.row_gpios.len().min(255) as u8))?;
        }
        for &gpio in &matrix.col_gpios {
            config
                .col_gpios
                .push(gpio)
                .map_err(|_| qmatrix::config::ConfigError::TooManyCols(matrix.col_gpios.len().min(255) as u8))?;
        }
        Ok(config)
    }

    /// Keyboard configuration of the core driver over a keymap built by [`Self::build_keymap`].
    pub fn keyboard_config<'a>(&self, keymap: &'a [Keycode]) -> ConfigResult<KeyboardConfig<'a>> {
        let layout = &self.layout;
        let config = KeyboardConfig::new(
            layout.layers,
            layout.rows,
            layout.cols,
            keymap,
            layout.mod_tap_timeout_ms,
        )?;
        self.matrix_config()?.validate(&config)?;
        Ok(config)
    }
}

const fn default_false() -> bool {
    false
}

#[cfg(test)]
mod test {
    use super::*;

    const KEYBOARD_TOML: &str = r#"
[keyboard]
name = "macropad"

[matrix]
row_gpios = [4, 5]
col_gpios = [10, 11, 12]
active_low = true

[layout]
layers = 2
rows = 2
cols = 3
keymap = [
    [
        ["A", "B", "MO(1)"],
        ["LCTL(C)", "LT(1, Space)", "TO(1)"],
    ],
    [
        ["Kc1", "__", "__"],
        ["_", "0x0005", "TO(0)"],
    ],
]
"#;

    #[test]
    fn test_load_from_str() {
        let config = KeyboardTomlConfig::new_from_toml_str(KEYBOARD_TOML).unwrap();
        assert_eq!(config.keyboard.name, "macropad");
        assert_eq!(config.matrix.debounce_ms, defaults::DEBOUNCE_MS);
        assert_eq!(config.matrix.poll_interval_ms, defaults::POLL_INTERVAL_MS);
        assert!(config.matrix.active_low);
        assert_eq!(config.layout.mod_tap_timeout_ms, 200);
    }

    #[test]
    fn test_build_keymap() {
        let config = KeyboardTomlConfig::new_from_toml_str(KEYBOARD_TOML).unwrap();
        let keymap = config.build_keymap().unwrap();
        assert_eq!(
            keymap,
            vec![0x04, 0x05, 0x5101, 0x0106, 0x412C, 0x5011, 0x1E, 0x01, 0x01, 0x00, 0x05, 0x5010]
        );

        let keyboard = config.keyboard_config(&keymap).unwrap();
        assert_eq!(keyboard.layers(), 2);
        assert_eq!(keyboard.keymap().lookup(1, 0, 0), Ok(0x1E));
    }

    #[test]
    fn test_matrix_config() {
        let config = KeyboardTomlConfig::new_from_toml_str(KEYBOARD_TOML).unwrap();
        let matrix = config.matrix_config().unwrap();
        assert_eq!(matrix.row_gpios.as_slice(), &[4, 5]);
        assert_eq!(matrix.col_gpios.as_slice(), &[10, 11, 12]);
        assert!(matrix.active_low);
        assert_eq!(matrix.debounce_ms, 5);
    }

    #[test]
    fn test_invalid_keycode() {
        let toml = KEYBOARD_TOML.replace("\"MO(1)\"", "\"MO(x)\"");
        let config = KeyboardTomlConfig::new_from_toml_str(&toml).unwrap();
        match config.build_keymap() {
            Err(ConfigError::InvalidKeycode { layer, row, col, expr, .. }) => {
                assert_eq!((layer, row, col), (0, 0, 2));
                assert_eq!(expr, "MO(x)");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_keymap_shape_mismatch() {
        let toml = KEYBOARD_TOML.replace("[\"Kc1\", \"__\", \"__\"]", "[\"Kc1\", \"__\"]");
        let config = KeyboardTomlConfig::new_from_toml_str(&toml).unwrap();
        assert!(matches!(
            config.build_keymap(),
            Err(ConfigError::Validation { field, .. }) if field == "layout.keymap[1][0]"
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        for field in ["scan_mode = 1", "wakeup = true", "no_autorepeat = true"] {
            let toml = KEYBOARD_TOML.replace("active_low = true", &format!("active_low = true\n{}", field));
            assert!(matches!(
                KeyboardTomlConfig::new_from_toml_str(&toml),
                Err(ConfigError::TomlParse { .. })
            ));
        }
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            KeyboardTomlConfig::new_from_toml_str("[matrix\nrow_gpios = [1]"),
            Err(ConfigError::TomlParse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            KeyboardTomlConfig::new_from_toml_path("/nonexistent/keyboard.toml"),
            Err(ConfigError::FileRead { .. })
        ));
    }
}
