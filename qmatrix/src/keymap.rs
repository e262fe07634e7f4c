use core::fmt;

use qmatrix_types::quantum::{KC_TRNS, Keycode};

use crate::layer::LayerState;

/// Keymap lookup errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeymapError {
    RowOutOfBounds { row: u8, rows: u8 },
    ColOutOfBounds { col: u8, cols: u8 },
    LayerOutOfBounds { layer: u8, layers: u32 },
}

impl fmt::Display for KeymapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeymapError::RowOutOfBounds { row, rows } => write!(f, "row {} out of bounds ({} rows)", row, rows),
            KeymapError::ColOutOfBounds { col, cols } => write!(f, "col {} out of bounds ({} cols)", col, cols),
            KeymapError::LayerOutOfBounds { layer, layers } => {
                write!(f, "layer {} out of bounds ({} layers)", layer, layers)
            }
        }
    }
}

impl core::error::Error for KeymapError {}

/// Keymap represents the stack of layers.
///
/// The layers are stored flattened, layer-major: the keycode of `(layer, row, col)` lives at
/// `(layer * rows + row) * cols + col`. The keymap is read only, several devices with the same
/// layout can share it.
#[derive(Debug, Clone, Copy)]
pub struct KeyMap<'a> {
    layers: u32,
    rows: u8,
    cols: u8,
    keycodes: &'a [Keycode],
}

impl<'a> KeyMap<'a> {
    /// `keycodes.len()` is checked against the dimensions by [`crate::config::KeyboardConfig`].
    pub(crate) fn new(layers: u32, rows: u8, cols: u8, keycodes: &'a [Keycode]) -> Self {
        Self {
            layers,
            rows,
            cols,
            keycodes,
        }
    }

    pub fn layers(&self) -> u32 {
        self.layers
    }

    /// Get the keycode at `(layer, row, col)`. Out of range coordinates never wrap.
    pub fn lookup(&self, layer: u8, row: u8, col: u8) -> Result<Keycode, KeymapError> {
        if row >= self.rows {
            return Err(KeymapError::RowOutOfBounds { row, rows: self.rows });
        }
        if col >= self.cols {
            return Err(KeymapError::ColOutOfBounds { col, cols: self.cols });
        }
        if layer as u32 >= self.layers {
            return Err(KeymapError::LayerOutOfBounds {
                layer,
                layers: self.layers,
            });
        }
        let index = (layer as usize * self.rows as usize + row as usize) * self.cols as usize + col as usize;
        self.keycodes.get(index).copied().ok_or(KeymapError::LayerOutOfBounds {
            layer,
            layers: self.layers,
        })
    }

    /// Find the layer whose keycode should be used for a key press at `(row, col)`.
    ///
    /// Iterate from the highest configured layer down to layer 0: the first active layer whose
    /// keycode is not transparent wins. Falls back to layer 0.
    pub fn resolve_layer(&self, layer_state: LayerState, row: u8, col: u8) -> Result<u8, KeymapError> {
        for layer in (0..self.layers.min(LayerState::MAX_LAYERS as u32) as u8).rev() {
            if !layer_state.is_active(layer) {
                continue;
            }
            if self.lookup(layer, row, col)? != KC_TRNS {
                return Ok(layer);
            }
        }
        Ok(0)
    }
}
