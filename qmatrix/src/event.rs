use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

/// A raw matrix transition, as produced by the scanner.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardEvent {
    pub row: u8,
    pub col: u8,
    pub pressed: bool,
}

impl KeyboardEvent {
    pub const fn key(row: u8, col: u8, pressed: bool) -> Self {
        Self { row, col, pressed }
    }
}
