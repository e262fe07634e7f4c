use heapless::Vec;
use qmatrix_types::keycode::HidKeyCode;
use qmatrix_types::modifier::HidModifiers;

use crate::config::{MATRIX_MAX_COLS, MATRIX_MAX_ROWS};
use crate::layer::LayerState;
use crate::sink::TimerHandle;

/// Max number of layer-tap keys held at the same time.
pub const MAX_PENDING_LAYER_TAPS: usize = 8;

/// Mutable state of one keyboard, owned by the scan loop.
#[derive(Debug, Clone)]
pub struct KeyboardState {
    layer_state: LayerState,
    mods: HidModifiers,
    /// Layer that resolved each key when it was pressed, so that the release uses the same layer
    layer_captured_at_press: [[u8; MATRIX_MAX_COLS]; MATRIX_MAX_ROWS],
    /// Press time of the held layer-tap keys, keyed by `(row, col)`
    pending_taps: Vec<(u8, u8, TimerHandle), MAX_PENDING_LAYER_TAPS>,
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardState {
    pub fn new() -> Self {
        Self {
            layer_state: LayerState::new(),
            mods: HidModifiers::new(),
            layer_captured_at_press: [[0; MATRIX_MAX_COLS]; MATRIX_MAX_ROWS],
            pending_taps: Vec::new(),
        }
    }

    pub fn layer_state(&self) -> LayerState {
        self.layer_state
    }

    pub(crate) fn layer_state_mut(&mut self) -> &mut LayerState {
        &mut self.layer_state
    }

    /// The highest active layer, reported as the current layer.
    pub fn active_layer(&self) -> u8 {
        self.layer_state.active_layer()
    }

    /// Modifiers currently held, in HID report layout.
    pub fn mods(&self) -> HidModifiers {
        self.mods
    }

    /// Track modifier keys going up and down.
    pub(crate) fn update_mods(&mut self, keycode: u8, pressed: bool) {
        let key = HidKeyCode::from(keycode);
        if !key.is_modifier() {
            return;
        }
        if pressed {
            self.mods |= key.to_hid_modifiers();
        } else {
            self.mods &= !key.to_hid_modifiers();
        }
    }

    pub fn captured_layer(&self, row: u8, col: u8) -> u8 {
        self.layer_captured_at_press[row as usize][col as usize]
    }

    pub(crate) fn capture_layer(&mut self, row: u8, col: u8, layer: u8) {
        self.layer_captured_at_press[row as usize][col as usize] = layer;
    }

    /// Record the press time of a layer-tap key. Returns false when too many are held already.
    pub(crate) fn start_tap(&mut self, row: u8, col: u8, handle: TimerHandle) -> bool {
        self.pending_taps.retain(|(r, c, _)| *r != row || *c != col);
        self.pending_taps.push((row, col, handle)).is_ok()
    }

    /// Take the press time of the layer-tap key at `(row, col)`.
    pub(crate) fn finish_tap(&mut self, row: u8, col: u8) -> Option<TimerHandle> {
        let index = self.pending_taps.iter().position(|(r, c, _)| *r == row && *c == col)?;
        Some(self.pending_taps.swap_remove(index).2)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mods_tracking() {
        let mut state = KeyboardState::new();
        state.update_mods(HidKeyCode::LShift as u8, true);
        state.update_mods(HidKeyCode::RAlt as u8, true);
        state.update_mods(HidKeyCode::A as u8, true);
        assert_eq!(state.mods().into_bits(), 0b0100_0010);
        state.update_mods(HidKeyCode::LShift as u8, false);
        assert_eq!(state.mods().into_bits(), 0b0100_0000);
    }

    #[test]
    fn test_pending_taps() {
        let mut state = KeyboardState::new();
        for i in 0..MAX_PENDING_LAYER_TAPS as u8 {
            assert!(state.start_tap(0, i, TimerHandle::from_ticks(i as u64)));
        }
        assert!(!state.start_tap(1, 0, TimerHandle::default()));
        // Restarting a held key replaces its entry
        assert!(state.start_tap(0, 3, TimerHandle::from_ticks(100)));
        assert_eq!(state.finish_tap(0, 3), Some(TimerHandle::from_ticks(100)));
        assert_eq!(state.finish_tap(0, 3), None);
        assert_eq!(state.finish_tap(1, 0), None);
    }

    #[test]
    fn test_captured_layer() {
        let mut state = KeyboardState::new();
        assert_eq!(state.captured_layer(31, 31), 0);
        state.capture_layer(31, 31, 3);
        assert_eq!(state.captured_layer(31, 31), 3);
    }
}
