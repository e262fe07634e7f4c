//! HID keyboard page usages.
//!
//! [`HidKeyCode`] is the only table of basic keys in the workspace: keycode names (used by the
//! configuration parser and by log output) and Linux input scan codes are both derived from it.

use serde::{Deserialize, Serialize};
use strum::{EnumString, FromRepr, IntoStaticStr};

use crate::modifier::{HidModifiers, ModifierCombination};

/// Linux `KEY_RESERVED`, reported for usages that have no input-subsystem counterpart.
pub const KEY_RESERVED: u16 = 0;

/// Usages of the HID keyboard/keypad page (0x07) that a matrix keymap can produce.
#[repr(u8)]
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord, FromRepr, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidKeyCode {
    /// Reserved, no-key.
    No = 0x00,
    /// Roll over error, not a physical key.
    ErrorRollover = 0x01,
    PostFail = 0x02,
    ErrorUndefined = 0x03,
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    Z = 0x1D,
    /// `1` and `!`
    Kc1 = 0x1E,
    /// `2` and `@`
    Kc2 = 0x1F,
    /// `3` and `#`
    Kc3 = 0x20,
    /// `4` and `$`
    Kc4 = 0x21,
    /// `5` and `%`
    Kc5 = 0x22,
    /// `6` and `^`
    Kc6 = 0x23,
    /// `7` and `&`
    Kc7 = 0x24,
    /// `8` and `*`
    Kc8 = 0x25,
    /// `9` and `(`
    Kc9 = 0x26,
    /// `0` and `)`
    Kc0 = 0x27,
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    /// `-` and `_`
    Minus = 0x2D,
    /// `=` and `+`
    Equal = 0x2E,
    /// `[` and `{`
    LeftBracket = 0x2F,
    /// `]` and `}`
    RightBracket = 0x30,
    /// `\` and `|`
    Backslash = 0x31,
    /// Non-US `#` and `~`
    NonusHash = 0x32,
    /// `;` and `:`
    Semicolon = 0x33,
    /// `'` and `"`
    Quote = 0x34,
    /// `` ` `` and `~`
    Grave = 0x35,
    /// `,` and `<`
    Comma = 0x36,
    /// `.` and `>`
    Dot = 0x37,
    /// `/` and `?`
    Slash = 0x38,
    CapsLock = 0x39,
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,
    NumLock = 0x53,
    KpSlash = 0x54,
    KpAsterisk = 0x55,
    KpMinus = 0x56,
    KpPlus = 0x57,
    KpEnter = 0x58,
    Kp1 = 0x59,
    Kp2 = 0x5A,
    Kp3 = 0x5B,
    Kp4 = 0x5C,
    Kp5 = 0x5D,
    Kp6 = 0x5E,
    Kp7 = 0x5F,
    Kp8 = 0x60,
    Kp9 = 0x61,
    Kp0 = 0x62,
    KpDot = 0x63,
    /// Non-US `\` and `|`
    NonusBackslash = 0x64,
    Application = 0x65,
    KbPower = 0x66,
    KpEqual = 0x67,
    F13 = 0x68,
    F14 = 0x69,
    F15 = 0x6A,
    F16 = 0x6B,
    F17 = 0x6C,
    F18 = 0x6D,
    F19 = 0x6E,
    F20 = 0x6F,
    F21 = 0x70,
    F22 = 0x71,
    F23 = 0x72,
    F24 = 0x73,
    Execute = 0x74,
    Help = 0x75,
    Menu = 0x76,
    Select = 0x77,
    Stop = 0x78,
    Again = 0x79,
    Undo = 0x7A,
    Cut = 0x7B,
    Copy = 0x7C,
    Paste = 0x7D,
    Find = 0x7E,
    KbMute = 0x7F,
    KbVolumeUp = 0x80,
    KbVolumeDown = 0x81,
    LockingCapsLock = 0x82,
    LockingNumLock = 0x83,
    LockingScrollLock = 0x84,
    KpComma = 0x85,
    KpEqualAs400 = 0x86,
    International1 = 0x87,
    International2 = 0x88,
    International3 = 0x89,
    International4 = 0x8A,
    International5 = 0x8B,
    International6 = 0x8C,
    International7 = 0x8D,
    International8 = 0x8E,
    International9 = 0x8F,
    Language1 = 0x90,
    Language2 = 0x91,
    Language3 = 0x92,
    Language4 = 0x93,
    Language5 = 0x94,
    Language6 = 0x95,
    Language7 = 0x96,
    Language8 = 0x97,
    Language9 = 0x98,
    AlternateErase = 0x99,
    SystemRequest = 0x9A,
    Cancel = 0x9B,
    Clear = 0x9C,
    Prior = 0x9D,
    Return = 0x9E,
    Separator = 0x9F,
    Out = 0xA0,
    Oper = 0xA1,
    ClearAgain = 0xA2,
    Crsel = 0xA3,
    Exsel = 0xA4,
    /// Left Control
    LCtrl = 0xE0,
    /// Left Shift
    LShift = 0xE1,
    /// Left Alt
    LAlt = 0xE2,
    /// Left GUI
    LGui = 0xE3,
    /// Right Control
    RCtrl = 0xE4,
    /// Right Shift
    RShift = 0xE5,
    /// Right Alt
    RAlt = 0xE6,
    /// Right GUI
    RGui = 0xE7,
}

impl HidKeyCode {
    /// Returns `true` if the keycode is a modifier keycode
    pub fn is_modifier(self) -> bool {
        HidKeyCode::LCtrl <= self && self <= HidKeyCode::RGui
    }

    /// Returns the modifier report bit of a modifier keycode, empty for other keys.
    pub fn to_hid_modifiers(self) -> HidModifiers {
        match self {
            HidKeyCode::LCtrl => HidModifiers::new().with_left_ctrl(true),
            HidKeyCode::LShift => HidModifiers::new().with_left_shift(true),
            HidKeyCode::LAlt => HidModifiers::new().with_left_alt(true),
            HidKeyCode::LGui => HidModifiers::new().with_left_gui(true),
            HidKeyCode::RCtrl => HidModifiers::new().with_right_ctrl(true),
            HidKeyCode::RShift => HidModifiers::new().with_right_shift(true),
            HidKeyCode::RAlt => HidModifiers::new().with_right_alt(true),
            HidKeyCode::RGui => HidModifiers::new().with_right_gui(true),
            _ => HidModifiers::new(),
        }
    }

    /// Modifier keycodes a [`ModifierCombination`] expands to, in emission order:
    /// ctrl, shift, alt, gui.
    pub fn modifier_keys(combination: ModifierCombination) -> impl Iterator<Item = HidKeyCode> {
        let right = combination.right();
        [
            (combination.ctrl(), HidKeyCode::LCtrl, HidKeyCode::RCtrl),
            (combination.shift(), HidKeyCode::LShift, HidKeyCode::RShift),
            (combination.alt(), HidKeyCode::LAlt, HidKeyCode::RAlt),
            (combination.gui(), HidKeyCode::LGui, HidKeyCode::RGui),
        ]
        .into_iter()
        .filter(|(set, _, _)| *set)
        .map(move |(_, left, right_key)| if right { right_key } else { left })
    }

    /// Name of the keycode, `"Unknown"` for bytes outside the table.
    pub fn name_of(code: u8) -> &'static str {
        match Self::from_repr(code) {
            Some(key) => key.into(),
            None => "Unknown",
        }
    }

    /// Linux input-subsystem code (`KEY_*`) for this usage.
    ///
    /// Usages without a counterpart map to [`KEY_RESERVED`].
    pub fn to_evdev(self) -> u16 {
        use HidKeyCode::*;
        match self {
            A => 30,
            B => 48,
            C => 46,
            D => 32,
            E => 18,
            F => 33,
            G => 34,
            H => 35,
            I => 23,
            J => 36,
            K => 37,
            L => 38,
            M => 50,
            N => 49,
            O => 24,
            P => 25,
            Q => 16,
            R => 19,
            S => 31,
            T => 20,
            U => 22,
            V => 47,
            W => 17,
            X => 45,
            Y => 21,
            Z => 44,
            Kc1 => 2,
            Kc2 => 3,
            Kc3 => 4,
            Kc4 => 5,
            Kc5 => 6,
            Kc6 => 7,
            Kc7 => 8,
            Kc8 => 9,
            Kc9 => 10,
            Kc0 => 11,
            Enter => 28,
            Escape => 1,
            Backspace => 14,
            Tab => 15,
            Space => 57,
            Minus => 12,
            Equal => 13,
            LeftBracket => 26,
            RightBracket => 27,
            Backslash | NonusHash => 43,
            Semicolon => 39,
            Quote => 40,
            Grave => 41,
            Comma => 51,
            Dot => 52,
            Slash => 53,
            CapsLock => 58,
            F1 => 59,
            F2 => 60,
            F3 => 61,
            F4 => 62,
            F5 => 63,
            F6 => 64,
            F7 => 65,
            F8 => 66,
            F9 => 67,
            F10 => 68,
            F11 => 87,
            F12 => 88,
            PrintScreen | SystemRequest => 99,
            ScrollLock => 70,
            Pause => 119,
            Insert => 110,
            Home => 102,
            PageUp => 104,
            Delete => 111,
            End => 107,
            PageDown => 109,
            Right => 106,
            Left => 105,
            Down => 108,
            Up => 103,
            NumLock => 69,
            KpSlash => 98,
            KpAsterisk => 55,
            KpMinus => 74,
            KpPlus => 78,
            KpEnter => 96,
            Kp1 => 79,
            Kp2 => 80,
            Kp3 => 81,
            Kp4 => 75,
            Kp5 => 76,
            Kp6 => 77,
            Kp7 => 71,
            Kp8 => 72,
            Kp9 => 73,
            Kp0 => 82,
            KpDot => 83,
            NonusBackslash => 86,
            Application => 127,
            KbPower => 116,
            KpEqual => 117,
            F13 => 183,
            F14 => 184,
            F15 => 185,
            F16 => 186,
            F17 => 187,
            F18 => 188,
            F19 => 189,
            F20 => 190,
            F21 => 191,
            F22 => 192,
            F23 => 193,
            F24 => 194,
            Execute => 134,
            Help => 138,
            Menu => 130,
            Select => 132,
            Stop => 128,
            Again => 129,
            Undo => 131,
            Cut => 137,
            Copy => 133,
            Paste => 135,
            Find => 136,
            KbMute => 113,
            KbVolumeUp => 115,
            KbVolumeDown => 114,
            KpComma => 121,
            International1 => 89,
            International2 => 93,
            International3 => 124,
            International4 => 92,
            International5 => 94,
            International6 => 95,
            Language1 => 122,
            Language2 => 123,
            Language3 => 90,
            Language4 => 91,
            Language5 => 85,
            LCtrl => 29,
            LShift => 42,
            LAlt => 56,
            LGui => 125,
            RCtrl => 97,
            RShift => 54,
            RAlt => 100,
            RGui => 126,
            _ => KEY_RESERVED,
        }
    }
}

impl ::postcard::experimental::max_size::MaxSize for HidKeyCode {
    const POSTCARD_MAX_SIZE: usize = 1usize;
}

impl From<u8> for HidKeyCode {
    fn from(value: u8) -> Self {
        Self::from_repr(value).unwrap_or(HidKeyCode::No)
    }
}
