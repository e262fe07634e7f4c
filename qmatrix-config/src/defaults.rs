//! Default values of `keyboard.toml` fields.

/// Default debounce time in milliseconds
pub const DEBOUNCE_MS: u16 = 5;

/// Default settle time after driving a column, in microseconds
pub const COL_SCAN_DELAY_US: u32 = 0;

/// Default polling interval in milliseconds
pub const POLL_INTERVAL_MS: u32 = 10;

/// Default layer-tap timeout in milliseconds
pub const MOD_TAP_TIMEOUT_MS: u16 = qmatrix::config::DEFAULT_MOD_TAP_TIMEOUT_MS;

/// Default keyboard name
pub const KEYBOARD_NAME: &str = "qmatrix";
