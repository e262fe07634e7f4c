//! Keycode resolution and dispatch of raw matrix events.

use core::fmt;

use qmatrix_types::keycode::HidKeyCode;
use qmatrix_types::quantum::{KC_NO, KC_TRNS, Keycode, QuantumKey, classify};

use crate::config::KeyboardConfig;
use crate::event::KeyboardEvent;
use crate::keymap::KeymapError;
use crate::sink::{EventSink, Timer};
use crate::state::KeyboardState;

/// Errors of dispatching a single matrix event. None of them is fatal: the event is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    RowOutOfBounds { row: u8, rows: u8 },
    ColOutOfBounds { col: u8, cols: u8 },
    /// The resolved keycode is outside every handled range
    UnhandledKeycode(Keycode),
    Keymap(KeymapError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::RowOutOfBounds { row, rows } => write!(f, "row {} out of bounds ({} rows)", row, rows),
            DispatchError::ColOutOfBounds { col, cols } => write!(f, "col {} out of bounds ({} cols)", col, cols),
            DispatchError::UnhandledKeycode(keycode) => write!(f, "unhandled keycode 0x{:04x}", keycode),
            DispatchError::Keymap(e) => write!(f, "keymap error: {}", e),
        }
    }
}

impl core::error::Error for DispatchError {}

impl From<KeymapError> for DispatchError {
    fn from(e: KeymapError) -> Self {
        match e {
            KeymapError::RowOutOfBounds { row, rows } => DispatchError::RowOutOfBounds { row, rows },
            KeymapError::ColOutOfBounds { col, cols } => DispatchError::ColOutOfBounds { col, cols },
            e => DispatchError::Keymap(e),
        }
    }
}

/// Resolve the keycode of a matrix event and run its action.
///
/// The layer of a key is chosen when it's pressed and reused on release, so that a key released
/// after a layer change still releases what it pressed, even when that keycode is unhandled. On
/// error nothing is emitted and only the captured layer of a pressed key is updated.
pub fn dispatch<S: EventSink, T: Timer>(
    state: &mut KeyboardState,
    config: &KeyboardConfig<'_>,
    sink: &mut S,
    timer: &mut T,
    event: KeyboardEvent,
) -> Result<(), DispatchError> {
    let KeyboardEvent { row, col, pressed } = event;
    if row >= config.rows() {
        return Err(DispatchError::RowOutOfBounds { row, rows: config.rows() });
    }
    if col >= config.cols() {
        return Err(DispatchError::ColOutOfBounds { col, cols: config.cols() });
    }

    let keymap = config.keymap();
    let layer = if pressed {
        keymap.resolve_layer(state.layer_state(), row, col)?
    } else {
        state.captured_layer(row, col)
    };
    if pressed {
        state.capture_layer(row, col, layer);
    }
    let keycode = keymap.lookup(layer, row, col)?;
    let Some(key) = classify(keycode) else {
        return Err(DispatchError::UnhandledKeycode(keycode));
    };
    debug!("Dispatch {:?} at layer {}: {:?}", event, layer, key);

    match key {
        QuantumKey::LayerTap { layer, key } => {
            if pressed {
                let handle = timer.timer_init();
                if !state.start_tap(row, col, handle) {
                    warn!("Too many layer-tap keys held, ({}, {}) acts as hold only", row, col);
                }
                state.layer_state_mut().activate(layer);
            } else {
                state.layer_state_mut().deactivate(layer);
                if let Some(handle) = state.finish_tap(row, col) {
                    let elapsed = timer.timer_elapsed(handle);
                    if elapsed < config.mod_tap_timeout_ms() as u64 {
                        emit(state, sink, key, true);
                        emit(state, sink, key, false);
                    }
                }
            }
        }
        QuantumKey::Goto { layer, .. } => {
            if pressed {
                state.layer_state_mut().set_only(layer);
            }
        }
        QuantumKey::Momentary { layer } => {
            if pressed {
                state.layer_state_mut().activate(layer);
            } else {
                state.layer_state_mut().deactivate(layer);
            }
        }
        QuantumKey::ModBundle { modifiers, key } => {
            if pressed {
                for m in HidKeyCode::modifier_keys(modifiers) {
                    emit(state, sink, m as u8, true);
                }
                emit(state, sink, key, true);
            } else {
                // Released in press order (ctrl, shift, alt, gui), not in reverse
                emit(state, sink, key, false);
                for m in HidKeyCode::modifier_keys(modifiers) {
                    emit(state, sink, m as u8, false);
                }
            }
        }
        QuantumKey::Basic(code) => {
            if code as Keycode == KC_TRNS || code as Keycode == KC_NO {
                // Nothing below the base layer to fall through to
                debug!("No key at ({}, {}), layer {}", row, col, layer);
            } else {
                emit(state, sink, code, pressed);
            }
        }
    }

    Ok(())
}

/// Send a key event, keeping track of held modifiers.
fn emit<S: EventSink>(state: &mut KeyboardState, sink: &mut S, keycode: u8, pressed: bool) {
    state.update_mods(keycode, pressed);
    sink.send_keycode(keycode, pressed);
}
