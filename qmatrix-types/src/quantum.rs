//! 16-bit keymap keycodes.
//!
//! A keymap cell holds a [`Keycode`]. The low 256 values are HID usages (plus the
//! [`KC_TRNS`] sentinel); the quantum ranges above encode layer and modifier actions. The
//! range table below is the only definition of these boundaries: the dispatcher classifies with
//! [`classify`] and the keymap builders encode with the `const fn`s of this module.

use serde::{Deserialize, Serialize};

use crate::keycode::HidKeyCode;
use crate::modifier::ModifierCombination;

/// A keymap entry.
pub type Keycode = u16;

/// No key.
pub const KC_NO: Keycode = 0x0000;
/// Transparent: use the next lower active layer for this cell.
pub const KC_TRNS: Keycode = 0x0001;

/// Upper bound (exclusive) of the basic range handled as plain HID usages.
pub const QK_BASIC_MAX: Keycode = 0x00FF;

pub const QK_MODS: Keycode = 0x0100;
pub const QK_LCTL: Keycode = 0x0100;
pub const QK_LSFT: Keycode = 0x0200;
pub const QK_LALT: Keycode = 0x0400;
pub const QK_LGUI: Keycode = 0x0800;
pub const QK_RMODS_MIN: Keycode = 0x1000;
pub const QK_RCTL: Keycode = 0x1100;
pub const QK_RSFT: Keycode = 0x1200;
pub const QK_RALT: Keycode = 0x1400;
pub const QK_RGUI: Keycode = 0x1800;
pub const QK_MODS_MAX: Keycode = 0x1FFF;

pub const QK_LAYER_TAP: Keycode = 0x4000;
pub const QK_LAYER_TAP_MAX: Keycode = 0x4FFF;

pub const QK_TO: Keycode = 0x5000;
pub const QK_TO_MAX: Keycode = 0x50FF;

pub const QK_MOMENTARY: Keycode = 0x5100;
pub const QK_MOMENTARY_MAX: Keycode = 0x51FF;

/// Value of the `when` field of a goto-layer keycode that acts on press.
pub const ON_PRESS: u8 = 1;

/// Decoded form of a keymap keycode, see [`classify`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QuantumKey {
    /// Tap for `key`, hold for momentary `layer`.
    LayerTap { layer: u8, key: u8 },
    /// Make `layer` the only active layer above the base layer.
    Goto { layer: u8, when: u8 },
    /// `layer` is active while held.
    Momentary { layer: u8 },
    /// `key` sent together with a fixed set of modifiers.
    ModBundle { modifiers: ModifierCombination, key: u8 },
    /// A HID usage sent as is.
    Basic(u8),
}

/// Classify a keycode, `None` when it is outside every handled range.
///
/// Ranges are tried in dispatch priority order: layer-tap, goto, momentary, mod-bundle, basic.
pub const fn classify(keycode: Keycode) -> Option<QuantumKey> {
    match keycode {
        QK_LAYER_TAP..=QK_LAYER_TAP_MAX => Some(QuantumKey::LayerTap {
            layer: ((keycode >> 8) & 0xF) as u8,
            key: (keycode & 0xFF) as u8,
        }),
        QK_TO..=QK_TO_MAX => Some(QuantumKey::Goto {
            layer: (keycode & 0xF) as u8,
            when: ((keycode >> 4) & 0x3) as u8,
        }),
        QK_MOMENTARY..=QK_MOMENTARY_MAX => Some(QuantumKey::Momentary {
            layer: (keycode & 0xFF) as u8,
        }),
        QK_MODS..=QK_MODS_MAX => Some(QuantumKey::ModBundle {
            modifiers: ModifierCombination::from_keycode(keycode),
            key: (keycode & 0xFF) as u8,
        }),
        _ if keycode < QK_BASIC_MAX => Some(QuantumKey::Basic(keycode as u8)),
        _ => None,
    }
}

/// Basic keycode of a HID usage.
pub const fn basic(key: HidKeyCode) -> Keycode {
    key as Keycode
}

/// Momentary layer keycode, `MO(layer)`.
pub const fn momentary(layer: u8) -> Keycode {
    QK_MOMENTARY | layer as Keycode
}

/// Layer-tap keycode, `LT(layer, key)`. Layers above 15 do not fit and are masked.
pub const fn layer_tap(layer: u8, key: HidKeyCode) -> Keycode {
    QK_LAYER_TAP | (((layer & 0xF) as Keycode) << 8) | key as Keycode
}

/// Goto-layer keycode, `TO(layer)`, acting on press.
pub const fn goto(layer: u8) -> Keycode {
    QK_TO | ((ON_PRESS as Keycode) << 4) | (layer & 0xF) as Keycode
}

/// Mod-bundle keycode: `key` sent with `modifiers`.
pub const fn with_modifiers(key: HidKeyCode, modifiers: ModifierCombination) -> Keycode {
    QK_MODS | modifiers.to_keycode_bits() | key as Keycode
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_classify_ranges() {
        assert_eq!(classify(0x0004), Some(QuantumKey::Basic(0x04)));
        assert_eq!(classify(KC_TRNS), Some(QuantumKey::Basic(0x01)));
        assert_eq!(classify(0x00E1), Some(QuantumKey::Basic(0xE1)));
        assert_eq!(classify(0x00FF), None);
        assert_eq!(classify(0x5102), Some(QuantumKey::Momentary { layer: 2 }));
        assert_eq!(classify(0x4304), Some(QuantumKey::LayerTap { layer: 3, key: 0x04 }));
        assert_eq!(classify(0x5013), Some(QuantumKey::Goto { layer: 3, when: 1 }));
        assert_eq!(classify(0x2000), None);
        assert_eq!(classify(0x7000), None);
        match classify(0x0304) {
            Some(QuantumKey::ModBundle { modifiers, key }) => {
                assert!(modifiers.ctrl() && modifiers.shift());
                assert_eq!(key, 0x04);
            }
            other => panic!("unexpected classification {:?}", other),
        }
    }

    #[test]
    fn test_builders_match_classifier() {
        assert_eq!(momentary(1), 0x5101);
        assert_eq!(layer_tap(3, HidKeyCode::A), 0x4304);
        assert_eq!(goto(2), 0x5012);
        assert_eq!(with_modifiers(HidKeyCode::A, ModifierCombination::LCTRL | ModifierCombination::LSHIFT), 0x0304);
        assert_eq!(with_modifiers(HidKeyCode::Tab, ModifierCombination::RALT), 0x142B);
        assert_eq!(
            classify(with_modifiers(HidKeyCode::Tab, ModifierCombination::RALT)),
            Some(QuantumKey::ModBundle {
                modifiers: ModifierCombination::RALT,
                key: HidKeyCode::Tab as u8
            })
        );
    }
}
